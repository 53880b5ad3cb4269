//! Addressing strategies.
//!
//! A [`Strategy`] turns a logical [`Key`] into reads and writes on the
//! strip. Geometry-based strategies resolve keys through the ceiling's
//! [`SpatialIndex`], which [`Target`] builds on first use.

mod cartesian;
mod key;
mod polar;
mod row;
mod sequential;

use std::fmt;

pub use key::{Access, Key, KeyError, KeyShape};
pub use polar::to_cartesian;

use crate::blend::{self, ChannelRounding, EffectRadius};
use crate::config::{DEFAULT_ORIGIN, DEFAULT_SEARCH_RANGE};
use crate::layout::RowLayout;
use crate::spatial::{SpatialIndex, round_to};
use crate::{Color, PixelBuffer};

/// Decimal places point coordinates are rounded to before a spatial query.
pub(crate) const POINT_PRECISION: i32 = 3;

/// Decimal places circle fills are rounded to before a spatial query.
pub(crate) const FILL_PRECISION: i32 = 2;

/// The scheme currently used to interpret keys.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Strategy {
    /// Wiring order. Accepts [`Key::Index`] and [`Key::Range`].
    #[default]
    Sequential,
    /// Physical rows. Accepts [`Key::Cell`], and [`Key::Index`] as a whole
    /// row when writing.
    Row,
    /// Nearest light to a point, or every light in a box.
    Cartesian { search_range: f32 },
    /// Nearest light to a `(radius, angle)` around `origin`, or every light
    /// in a circle.
    Polar { origin: (f32, f32), search_range: f32 },
    /// Like [`Strategy::Cartesian`], but writing a point spreads the color
    /// over every light within the effect radius.
    FractionalCartesian { effect_radius: EffectRadius },
    /// Like [`Strategy::Polar`], but writing a point spreads the color over
    /// every light within the effect radius.
    FractionalPolar {
        origin: (f32, f32),
        effect_radius: EffectRadius,
    },
}

impl Strategy {
    pub const fn cartesian() -> Self {
        Self::Cartesian {
            search_range: DEFAULT_SEARCH_RANGE,
        }
    }

    pub const fn polar() -> Self {
        Self::Polar {
            origin: DEFAULT_ORIGIN,
            search_range: DEFAULT_SEARCH_RANGE,
        }
    }

    pub const fn fractional_cartesian() -> Self {
        Self::FractionalCartesian {
            effect_radius: EffectRadius::DEFAULT,
        }
    }

    pub const fn fractional_polar() -> Self {
        Self::FractionalPolar {
            origin: DEFAULT_ORIGIN,
            effect_radius: EffectRadius::DEFAULT,
        }
    }

    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::Sequential => StrategyKind::Sequential,
            Self::Row => StrategyKind::Row,
            Self::Cartesian { .. } => StrategyKind::Cartesian,
            Self::Polar { .. } => StrategyKind::Polar,
            Self::FractionalCartesian { .. } => StrategyKind::FractionalCartesian,
            Self::FractionalPolar { .. } => StrategyKind::FractionalPolar,
        }
    }

    /// Whether resolving keys needs the spatial index.
    pub const fn uses_geometry(&self) -> bool {
        !matches!(self, Self::Sequential | Self::Row)
    }

    pub(crate) fn get<P: PixelBuffer>(
        &self,
        target: &mut Target<'_, P>,
        key: &Key,
    ) -> Result<Option<Color>, KeyError> {
        let kind = self.kind();
        match *self {
            Self::Sequential => sequential::get(target, key),
            Self::Row => row::get(target, key),
            Self::Cartesian { search_range } => {
                cartesian::get(target, key, Reach::Nearest(search_range), kind)
            }
            Self::FractionalCartesian { effect_radius } => {
                cartesian::get(target, key, Reach::Spread(effect_radius), kind)
            }
            Self::Polar {
                origin,
                search_range,
            } => polar::get(target, key, origin, Reach::Nearest(search_range), kind),
            Self::FractionalPolar {
                origin,
                effect_radius,
            } => polar::get(target, key, origin, Reach::Spread(effect_radius), kind),
        }
    }

    pub(crate) fn set<P: PixelBuffer>(
        &self,
        target: &mut Target<'_, P>,
        key: &Key,
        color: Color,
    ) -> Result<(), KeyError> {
        let kind = self.kind();
        match *self {
            Self::Sequential => sequential::set(target, key, color),
            Self::Row => row::set(target, key, color),
            Self::Cartesian { search_range } => {
                cartesian::set(target, key, color, Reach::Nearest(search_range), kind)
            }
            Self::FractionalCartesian { effect_radius } => {
                cartesian::set(target, key, color, Reach::Spread(effect_radius), kind)
            }
            Self::Polar {
                origin,
                search_range,
            } => polar::set(target, key, color, origin, Reach::Nearest(search_range), kind),
            Self::FractionalPolar {
                origin,
                effect_radius,
            } => polar::set(target, key, color, origin, Reach::Spread(effect_radius), kind),
        }
    }
}

/// The six addressing schemes without their parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Sequential,
    Row,
    Cartesian,
    Polar,
    FractionalCartesian,
    FractionalPolar,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sequential => "sequential",
            Self::Row => "row",
            Self::Cartesian => "cartesian",
            Self::Polar => "polar",
            Self::FractionalCartesian => "fractional cartesian",
            Self::FractionalPolar => "fractional polar",
        })
    }
}

/// How far a point key reaches, and what writing it does.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Reach {
    /// Write the single nearest light within the range.
    Nearest(f32),
    /// Blend into every light within the radius.
    Spread(EffectRadius),
}

impl Reach {
    /// Farthest distance a point read may resolve to.
    fn distance(self) -> f32 {
        match self {
            Self::Nearest(range) => range,
            Self::Spread(radius) => radius.get(),
        }
    }
}

/// Everything a strategy reads and writes while resolving one key.
pub(crate) struct Target<'a, P> {
    pub pixels: &'a mut P,
    pub layout: &'a RowLayout,
    pub space: &'a mut Option<SpatialIndex>,
    pub rounding: ChannelRounding,
}

impl<P: PixelBuffer> Target<'_, P> {
    /// The spatial index, built from the layout if it was detached.
    pub fn space(&mut self) -> &mut SpatialIndex {
        let layout = self.layout;
        self.space.get_or_insert_with(|| SpatialIndex::build(layout))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.total()
    }

    pub fn read(&self, index: Option<usize>) -> Option<Color> {
        index.map(|index| self.pixels.get(index))
    }

    pub fn paint(&mut self, indices: impl IntoIterator<Item = usize>, color: Color) {
        for index in indices {
            self.pixels.set(index, color);
        }
    }

    /// Nearest light to `(x, y)` within `max_distance`, after rounding.
    pub fn nearest(&mut self, x: f32, y: f32, max_distance: f32) -> Option<usize> {
        let (x, y) = (round_to(x, POINT_PRECISION), round_to(y, POINT_PRECISION));
        self.space().nearest(x, y, max_distance)
    }

    /// Paint every light within `radius` of `(x, y)` with `color`.
    pub fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color) {
        let indices = self.space().radius(
            round_to(x, FILL_PRECISION),
            round_to(y, FILL_PRECISION),
            round_to(radius, FILL_PRECISION),
        );
        self.paint(indices, color);
    }

    /// Blend `color` into every light within `radius` of `(x, y)`, fading
    /// linearly with distance.
    pub fn spread(&mut self, x: f32, y: f32, radius: EffectRadius, color: Color) {
        let (x, y) = (round_to(x, POINT_PRECISION), round_to(y, POINT_PRECISION));
        let space = self.space();
        let reached: Vec<(usize, f32)> = space
            .radius(x, y, radius.get())
            .into_iter()
            .map(|index| (index, space.leds()[index].distance_to(x, y)))
            .collect();

        for (index, distance) in reached {
            let current = self.pixels.get(index);
            if let Some(blended) = blend::contribution(current, color, distance, radius, self.rounding)
            {
                self.pixels.set(index, blended);
            }
        }
    }
}
