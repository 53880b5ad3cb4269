//! Intensity blending for fractional writes.
//!
//! A fractional write paints every light within an [`EffectRadius`] with the
//! requested color scaled by `max(0, 1 - distance / radius)`, merged into the
//! current color with a per-channel maximum. Overlapping writes within a frame
//! therefore brighten but never darken a light, and the order they are applied
//! in does not matter.

use crate::Color;
use crate::config::ConfigError;

/// How a scaled floating channel value turns back into an 8-bit channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelRounding {
    /// Drop the fractional part (`200 * 0.999 -> 199`).
    #[default]
    Truncate,
    /// Round to the nearest integer (`200 * 0.999 -> 200`).
    Round,
}

impl ChannelRounding {
    #[inline]
    fn apply(self, value: f32) -> u8 {
        let value = match self {
            Self::Truncate => value.trunc(),
            Self::Round => value.round(),
        };
        value.clamp(0.0, 255.0) as u8
    }
}

/// Radius over which a fractional write spreads. Always positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectRadius(f32);

impl EffectRadius {
    pub const DEFAULT: Self = Self(0.2);

    pub fn new(radius: f32) -> Result<Self, ConfigError> {
        if radius > 0.0 && radius.is_finite() {
            Ok(Self(radius))
        } else {
            Err(ConfigError::EffectRadius(radius))
        }
    }

    #[inline]
    pub const fn get(self) -> f32 {
        self.0
    }

    /// Share of the full color a light `distance` away receives.
    ///
    /// `1.0` at the centre, falling linearly to `0.0` at the radius and beyond.
    #[inline]
    pub fn falloff(self, distance: f32) -> f32 {
        (1.0 - distance / self.0).max(0.0)
    }
}

impl Default for EffectRadius {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Scale every channel of `color` by `factor` (clamped to `0..=1`).
pub fn scale(color: Color, factor: f32, rounding: ChannelRounding) -> Color {
    let factor = factor.clamp(0.0, 1.0);
    Color::new(
        rounding.apply(f32::from(color.r) * factor),
        rounding.apply(f32::from(color.g) * factor),
        rounding.apply(f32::from(color.b) * factor),
    )
}

/// Per-channel maximum of two colors.
#[inline]
pub fn merge_max(a: Color, b: Color) -> Color {
    Color::new(a.r.max(b.r), a.g.max(b.g), a.b.max(b.b))
}

/// The color a light `distance` away from a fractional write ends up with,
/// or `None` when the write does not reach it.
pub fn contribution(
    current: Color,
    requested: Color,
    distance: f32,
    radius: EffectRadius,
    rounding: ChannelRounding,
) -> Option<Color> {
    let factor = radius.falloff(distance);
    if factor <= 0.0 {
        return None;
    }
    Some(merge_max(current, scale(requested, factor, rounding)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const WHITE: Color = Color::new(255, 255, 255);
    const BLACK: Color = Color::new(0, 0, 0);

    #[test]
    fn test_effect_radius_must_be_positive() {
        assert!(EffectRadius::new(0.1).is_ok());
        assert_eq!(EffectRadius::new(0.0), Err(ConfigError::EffectRadius(0.0)));
        assert_eq!(EffectRadius::new(-1.0), Err(ConfigError::EffectRadius(-1.0)));
        assert!(EffectRadius::new(f32::NAN).is_err());
        assert!(EffectRadius::new(f32::INFINITY).is_err());
    }

    #[test_case(0.0 => 1.0; "centre")]
    #[test_case(0.1 => 0.5; "halfway")]
    #[test_case(0.2 => 0.0; "edge")]
    #[test_case(0.5 => 0.0; "outside")]
    fn test_falloff(distance: f32) -> f32 {
        EffectRadius::new(0.2).unwrap().falloff(distance)
    }

    #[test_case(ChannelRounding::Truncate => Color::new(99, 0, 127); "truncate")]
    #[test_case(ChannelRounding::Round => Color::new(100, 0, 128); "round")]
    fn test_scale_rounding(rounding: ChannelRounding) -> Color {
        scale(Color::new(199, 0, 255), 0.5, rounding)
    }

    #[test]
    fn test_merge_max_is_per_channel() {
        let merged = merge_max(Color::new(10, 200, 30), Color::new(50, 20, 30));
        assert_eq!(merged, Color::new(50, 200, 30));
    }

    #[test]
    fn test_contribution_full_at_centre() {
        let radius = EffectRadius::new(0.2).unwrap();
        let color = Color::new(12, 34, 56);
        assert_eq!(
            contribution(BLACK, color, 0.0, radius, ChannelRounding::Truncate),
            Some(color)
        );
    }

    #[test]
    fn test_contribution_none_at_or_beyond_radius() {
        let radius = EffectRadius::new(0.2).unwrap();
        assert_eq!(
            contribution(BLACK, WHITE, 0.2, radius, ChannelRounding::Truncate),
            None
        );
        assert_eq!(
            contribution(BLACK, WHITE, 0.3, radius, ChannelRounding::Truncate),
            None
        );
    }

    #[test]
    fn test_contribution_never_darkens() {
        let radius = EffectRadius::new(0.2).unwrap();
        let current = Color::new(200, 10, 150);
        let blended =
            contribution(current, WHITE, 0.15, radius, ChannelRounding::Truncate).unwrap();
        assert!(blended.r >= current.r);
        assert!(blended.g >= current.g);
        assert!(blended.b >= current.b);
    }

    #[test]
    fn test_contributions_are_order_independent() {
        let radius = EffectRadius::new(0.2).unwrap();
        let red = Color::new(255, 0, 0);
        let blue = Color::new(0, 0, 255);
        let rounding = ChannelRounding::Truncate;

        let red_first = contribution(
            contribution(BLACK, red, 0.05, radius, rounding).unwrap(),
            blue,
            0.12,
            radius,
            rounding,
        );
        let blue_first = contribution(
            contribution(BLACK, blue, 0.12, radius, rounding).unwrap(),
            red,
            0.05,
            radius,
            rounding,
        );
        assert_eq!(red_first, blue_first);
    }
}
