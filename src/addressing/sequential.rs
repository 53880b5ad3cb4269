use super::{Access, Key, KeyError, StrategyKind, Target};
use crate::layout::wrap;
use crate::{Color, PixelBuffer};

pub(super) fn get<P: PixelBuffer>(
    target: &mut Target<'_, P>,
    key: &Key,
) -> Result<Option<Color>, KeyError> {
    match *key {
        Key::Index(index) => Ok(target.read(Some(wrap(index, target.len())))),
        _ => Err(KeyError::unsupported(StrategyKind::Sequential, Access::Get, key)),
    }
}

pub(super) fn set<P: PixelBuffer>(
    target: &mut Target<'_, P>,
    key: &Key,
    color: Color,
) -> Result<(), KeyError> {
    match *key {
        Key::Index(index) => {
            let index = wrap(index, target.len());
            target.paint([index], color);
        }
        Key::Range { start, stop, step } => {
            let indices = range_indices(start, stop, step, target.len())?;
            target.paint(indices, color);
        }
        _ => return Err(KeyError::unsupported(StrategyKind::Sequential, Access::Set, key)),
    }
    Ok(())
}

/// Strip indices selected by a `start..stop` range walked every `step`.
///
/// Bounds default to the whole strip and may be negative or past the end,
/// every selected index wraps modulo `len`. A negative step walks down from
/// `start` while the index stays above `stop`.
///
/// Walking further than `len` steps only revisits lights, so the walk stops
/// there however far away `stop` is.
pub(crate) fn range_indices(
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
    len: usize,
) -> Result<Vec<usize>, KeyError> {
    let start = start.unwrap_or(0);
    let stop = stop.unwrap_or(len as i64);
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(KeyError::ZeroStep);
    }

    Ok(std::iter::successors(Some(start), |i| i.checked_add(step))
        .take_while(|&i| if step > 0 { i < stop } else { i > stop })
        .take(len)
        .map(|i| wrap(i, len))
        .collect())
}
