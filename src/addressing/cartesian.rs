use super::{Access, Key, KeyError, POINT_PRECISION, Reach, StrategyKind, Target};
use crate::spatial::round_to;
use crate::{Color, PixelBuffer};

/// Margin added on every side of a box so lights on its border are included.
pub(crate) const BOX_EPSILON: f32 = 0.01;

pub(super) fn get<P: PixelBuffer>(
    target: &mut Target<'_, P>,
    key: &Key,
    reach: Reach,
    kind: StrategyKind,
) -> Result<Option<Color>, KeyError> {
    match *key {
        Key::Point { x, y } => {
            let found = target.nearest(x, y, reach.distance());
            Ok(target.read(found))
        }
        _ => Err(KeyError::unsupported(kind, Access::Get, key)),
    }
}

pub(super) fn set<P: PixelBuffer>(
    target: &mut Target<'_, P>,
    key: &Key,
    color: Color,
    reach: Reach,
    kind: StrategyKind,
) -> Result<(), KeyError> {
    match *key {
        Key::Point { x, y } => match reach {
            Reach::Nearest(range) => {
                let found = target.nearest(x, y, range);
                target.paint(found, color);
            }
            Reach::Spread(radius) => target.spread(x, y, radius, color),
        },
        Key::Area { from, to } => {
            let indices = area_indices(target, from, to);
            target.paint(indices, color);
        }
        _ => return Err(KeyError::unsupported(kind, Access::Set, key)),
    }
    Ok(())
}

/// Every light inside the box spanned by two corners, widened by
/// [`BOX_EPSILON`]. A box without width or height holds nothing.
fn area_indices<P: PixelBuffer>(
    target: &mut Target<'_, P>,
    from: (f32, f32),
    to: (f32, f32),
) -> Vec<usize> {
    let width = (to.0 - from.0).abs();
    let height = (to.1 - from.1).abs();
    if !(width > 0.0 && height > 0.0) {
        return Vec::new();
    }

    let x = from.0.min(to.0) + width / 2.0;
    let y = from.1.min(to.1) + height / 2.0;
    target.space().region(
        round_to(x, POINT_PRECISION),
        round_to(y, POINT_PRECISION),
        round_to(width + 2.0 * BOX_EPSILON, POINT_PRECISION),
        round_to(height + 2.0 * BOX_EPSILON, POINT_PRECISION),
    )
}
