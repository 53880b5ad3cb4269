use super::{Access, Key, KeyError, StrategyKind, Target};
use crate::{Color, PixelBuffer};

pub(super) fn get<P: PixelBuffer>(
    target: &mut Target<'_, P>,
    key: &Key,
) -> Result<Option<Color>, KeyError> {
    match *key {
        Key::Cell { row, col } => {
            let index = target.layout.row_col_to_index(row, col);
            Ok(target.read(Some(index)))
        }
        _ => Err(KeyError::unsupported(StrategyKind::Row, Access::Get, key)),
    }
}

pub(super) fn set<P: PixelBuffer>(
    target: &mut Target<'_, P>,
    key: &Key,
    color: Color,
) -> Result<(), KeyError> {
    match *key {
        Key::Cell { row, col } => {
            let index = target.layout.row_col_to_index(row, col);
            target.paint([index], color);
        }
        // A bare row lights the whole physical row, whichever way it is wired.
        Key::Index(row) => {
            let span = target.layout.row_span(row);
            target.paint(span, color);
        }
        _ => return Err(KeyError::unsupported(StrategyKind::Row, Access::Set, key)),
    }
    Ok(())
}
