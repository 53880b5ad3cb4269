use super::{Access, Key, KeyError, Reach, StrategyKind, Target};
use crate::{Color, PixelBuffer};

/// Map `(radius, angle)` around `origin` into the unit square.
///
/// The angle is in degrees from the +x axis and wraps modulo 360. A radius of
/// `1.0` spans half the square, so the unit circle around the default origin
/// touches every edge.
pub fn to_cartesian(origin: (f32, f32), radius: f32, angle: f32) -> (f32, f32) {
    let theta = angle.rem_euclid(360.0).to_radians();
    let (sin, cos) = theta.sin_cos();
    (radius * cos / 2.0 + origin.0, radius * sin / 2.0 + origin.1)
}

pub(super) fn get<P: PixelBuffer>(
    target: &mut Target<'_, P>,
    key: &Key,
    origin: (f32, f32),
    reach: Reach,
    kind: StrategyKind,
) -> Result<Option<Color>, KeyError> {
    match *key {
        Key::Polar { radius, angle } => {
            let (x, y) = to_cartesian(origin, radius, angle);
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
    origin: (f32, f32),
    reach: Reach,
    kind: StrategyKind,
) -> Result<(), KeyError> {
    match *key {
        Key::Polar { radius, angle } => {
            let (x, y) = to_cartesian(origin, radius, angle);
            match reach {
                Reach::Nearest(range) => {
                    let found = target.nearest(x, y, range);
                    target.paint(found, color);
                }
                Reach::Spread(effect_radius) => target.spread(x, y, effect_radius, color),
            }
        }
        Key::Fill { x, y, radius } => target.fill_circle(x, y, radius, color),
        _ => return Err(KeyError::unsupported(kind, Access::Set, key)),
    }
    Ok(())
}
