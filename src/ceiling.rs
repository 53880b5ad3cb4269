use std::ops::{Deref, DerefMut};

use crate::addressing::{Key, KeyError, Strategy, StrategyKind, Target};
use crate::blend::{ChannelRounding, EffectRadius};
use crate::config::{CeilingConfig, ConfigError};
use crate::layout::{RowLayout, wrap};
use crate::spatial::SpatialIndex;
use crate::{Color, PixelBuffer};

/// A strip of lights addressed through one active [`Strategy`].
///
/// Owns the pixel buffer, the row layout and the spatial index built from
/// it. The index is built on the first geometry-based access and can be
/// detached with [`Ceiling::prepare_for_transfer`].
#[derive(Debug)]
pub struct Ceiling<P> {
    pixels: P,
    layout: RowLayout,
    space: Option<SpatialIndex>,
    strategy: Strategy,
    search_range: f32,
    effect_radius: EffectRadius,
    origin: (f32, f32),
    rounding: ChannelRounding,
}

impl<P: PixelBuffer> Ceiling<P> {
    /// Wrap `pixels`, laid out as `config.rows`, with sequential addressing.
    pub fn new(pixels: P, config: &CeilingConfig) -> Result<Self, ConfigError> {
        let layout = config.validate()?;
        check_length(&layout, &pixels)?;
        log::debug!(
            "ceiling with {} lights over {} rows",
            layout.total(),
            layout.row_count()
        );

        Ok(Self {
            pixels,
            layout,
            space: None,
            strategy: Strategy::Sequential,
            search_range: config.search_range,
            effect_radius: EffectRadius::new(config.effect_radius)?,
            origin: config.origin,
            rounding: config.rounding,
        })
    }

    // ----------------------------------------------------------------
    // Getting and setting
    // ----------------------------------------------------------------

    /// Read the light `key` resolves to under the active strategy.
    ///
    /// `Ok(None)` when a coordinate resolves to no light in range.
    pub fn get(&mut self, key: impl Into<Key>) -> Result<Option<Color>, KeyError> {
        let strategy = self.strategy;
        strategy.get(&mut self.target(), &key.into())
    }

    /// Write `color` to every light `key` resolves to under the active strategy.
    pub fn set(&mut self, key: impl Into<Key>, color: Color) -> Result<(), KeyError> {
        let strategy = self.strategy;
        strategy.set(&mut self.target(), &key.into(), color)
    }

    /// Read a light by strip index, wrapping, whatever the active strategy.
    pub fn get_by_index(&self, index: i64) -> Color {
        self.pixels.get(wrap(index, self.layout.total()))
    }

    /// Write a light by strip index, wrapping, whatever the active strategy.
    pub fn set_by_index(&mut self, index: i64, color: Color) {
        self.pixels.set(wrap(index, self.layout.total()), color);
    }

    /// Paint every light within `radius` of `center` in unit-square
    /// coordinates, whatever the active strategy.
    pub fn set_all_in_radius(&mut self, center: (f32, f32), radius: f32, color: Color) {
        self.target().fill_circle(center.0, center.1, radius, color);
    }

    /// Blend `color` around `center`, fading to nothing at `radius`, whatever
    /// the active strategy. Never darkens a light.
    pub fn blend_at(&mut self, center: (f32, f32), radius: EffectRadius, color: Color) {
        self.target().spread(center.0, center.1, radius, color);
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Turn every light off, flushing right away when `show` is set.
    pub fn clear(&mut self, show: bool) -> Result<(), P::Error> {
        self.fill(Color::default());
        if show {
            self.show()?;
        }
        Ok(())
    }

    pub fn show(&mut self) -> Result<(), P::Error> {
        self.pixels.show()
    }

    // ----------------------------------------------------------------
    // Layout
    // ----------------------------------------------------------------

    pub fn number_lights(&self) -> usize {
        self.layout.total()
    }

    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// Light counts per row, only while row addressing is active.
    pub fn rows(&self) -> Option<&[usize]> {
        match self.strategy {
            Strategy::Row => Some(self.layout.rows()),
            _ => None,
        }
    }

    /// Replace the row layout. The spatial index is rebuilt on next use.
    pub fn set_layout(&mut self, rows: impl Into<Vec<usize>>) -> Result<(), ConfigError> {
        let layout = RowLayout::new(rows)?;
        check_length(&layout, &self.pixels)?;
        log::debug!("row layout changed to {:?}", layout.rows());
        self.layout = layout;
        self.space = None;
        Ok(())
    }

    /// The spatial index, if one is currently attached.
    pub fn spatial_index(&self) -> Option<&SpatialIndex> {
        self.space.as_ref()
    }

    /// Drop memoized spatial queries, keeping light positions.
    pub fn reset_caches(&mut self) {
        if let Some(space) = self.space.as_mut() {
            space.reset_caches();
        }
    }

    /// Detach the spatial index before the ceiling is handed to another
    /// execution context. It is rebuilt from the layout on next use.
    pub fn prepare_for_transfer(&mut self) {
        if self.space.take().is_some() {
            log::debug!("spatial index detached for transfer");
        }
    }

    // ----------------------------------------------------------------
    // Strategies
    // ----------------------------------------------------------------

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Install `strategy`, clearing memoized queries of the previous one.
    pub fn use_strategy(&mut self, strategy: Strategy) {
        if strategy != self.strategy {
            log::debug!(
                "addressing switched from {} to {}",
                self.strategy.kind(),
                strategy.kind()
            );
        }
        self.strategy = strategy;
        self.reset_caches();
    }

    pub fn use_sequential(&mut self) {
        self.use_strategy(Strategy::Sequential);
    }

    pub fn use_row(&mut self) {
        self.use_strategy(Strategy::Row);
    }

    /// Cartesian addressing with the configured search range.
    pub fn use_cartesian(&mut self) {
        self.use_strategy(Strategy::Cartesian {
            search_range: self.search_range,
        });
    }

    /// Polar addressing around the configured origin.
    pub fn use_polar(&mut self) {
        self.use_strategy(Strategy::Polar {
            origin: self.origin,
            search_range: self.search_range,
        });
    }

    /// Fractional cartesian addressing with the configured effect radius.
    pub fn use_fractional_cartesian(&mut self) {
        self.use_strategy(Strategy::FractionalCartesian {
            effect_radius: self.effect_radius,
        });
    }

    /// Fractional polar addressing around the configured origin.
    pub fn use_fractional_polar(&mut self) {
        self.use_strategy(Strategy::FractionalPolar {
            origin: self.origin,
            effect_radius: self.effect_radius,
        });
    }

    /// Install `strategy` until the returned guard is dropped, then restore
    /// the strategy that was active before.
    pub fn scoped(&mut self, strategy: Strategy) -> StrategyGuard<'_, P> {
        let previous = self.strategy;
        self.use_strategy(strategy);
        StrategyGuard {
            ceiling: self,
            previous,
        }
    }

    /// Run `block` with `strategy` active, restoring the previous strategy
    /// afterwards, also when `block` panics.
    pub fn with_strategy<R>(&mut self, strategy: Strategy, block: impl FnOnce(&mut Self) -> R) -> R {
        let mut guard = self.scoped(strategy);
        block(&mut guard)
    }

    // ----------------------------------------------------------------
    // Pixel buffer access
    // ----------------------------------------------------------------

    pub fn pixels(&self) -> &P {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut P {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> P {
        self.pixels
    }

    fn target(&mut self) -> Target<'_, P> {
        Target {
            pixels: &mut self.pixels,
            layout: &self.layout,
            space: &mut self.space,
            rounding: self.rounding,
        }
    }
}

fn check_length<P: PixelBuffer>(layout: &RowLayout, pixels: &P) -> Result<(), ConfigError> {
    if layout.total() != pixels.len() {
        return Err(ConfigError::LengthMismatch {
            layout: layout.total(),
            pixels: pixels.len(),
        });
    }
    Ok(())
}

/// Restores the previously active strategy when dropped.
///
/// Created by [`Ceiling::scoped`]; dereferences to the ceiling.
#[derive(Debug)]
pub struct StrategyGuard<'a, P: PixelBuffer> {
    ceiling: &'a mut Ceiling<P>,
    previous: Strategy,
}

impl<P: PixelBuffer> Deref for StrategyGuard<'_, P> {
    type Target = Ceiling<P>;

    fn deref(&self) -> &Self::Target {
        self.ceiling
    }
}

impl<P: PixelBuffer> DerefMut for StrategyGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ceiling
    }
}

impl<P: PixelBuffer> Drop for StrategyGuard<'_, P> {
    fn drop(&mut self) {
        self.ceiling.use_strategy(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::addressing::{Access, KeyShape};
    use crate::mock::MemoryPixels;

    const RED: Color = Color::new(255, 0, 0);
    const BLUE: Color = Color::new(0, 0, 255);
    const DARK: Color = Color::new(0, 0, 0);

    /// Strip index of the light at (0.5, 0.5) on the installed arrangement.
    const CENTRE_LIGHT: usize = 100;

    fn installed() -> Ceiling<MemoryPixels> {
        Ceiling::new(MemoryPixels::new(200), &CeilingConfig::default()).unwrap()
    }

    fn small(rows: &[usize]) -> Ceiling<MemoryPixels> {
        let config = CeilingConfig::default().with_rows(rows);
        Ceiling::new(MemoryPixels::new(config.number_lights()), &config).unwrap()
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let result = Ceiling::new(MemoryPixels::new(10), &CeilingConfig::default());
        assert_eq!(
            result.err(),
            Some(ConfigError::LengthMismatch {
                layout: 200,
                pixels: 10
            })
        );
    }

    #[test]
    fn test_starts_sequential_without_spatial_index() {
        let ceiling = installed();
        assert_eq!(ceiling.strategy(), Strategy::Sequential);
        assert!(ceiling.spatial_index().is_none());
        assert_eq!(ceiling.number_lights(), 200);
    }

    #[test]
    fn test_sequential_index_wraps() {
        let mut ceiling = small(&[4, 4]);
        ceiling.set(9, RED).unwrap();
        ceiling.set(-1, BLUE).unwrap();

        assert_eq!(ceiling.get(1).unwrap(), Some(RED));
        assert_eq!(ceiling.get(7).unwrap(), Some(BLUE));
        assert_eq!(ceiling.pixels().lit(), vec![1, 7]);
    }

    #[test]
    fn test_sequential_range_with_step() {
        let mut ceiling = small(&[4, 4]);
        ceiling.set(Key::range(0, 4, 2), RED).unwrap();

        assert_eq!(ceiling.pixels().lit(), vec![0, 2]);
        assert_eq!(ceiling.get(1).unwrap(), Some(DARK));
    }

    #[test]
    fn test_sequential_rejects_point_key() {
        let mut ceiling = small(&[4, 4]);
        let error = ceiling.set((0.5, 0.5), RED).unwrap_err();

        assert_eq!(
            error,
            KeyError::Unsupported {
                strategy: StrategyKind::Sequential,
                access: Access::Set,
                shape: KeyShape::Point,
            }
        );
        assert!(ceiling.pixels().lit().is_empty());
    }

    #[test]
    fn test_row_cell_and_whole_row() {
        let mut ceiling = small(&[4, 4]);
        ceiling.use_row();

        ceiling.set((0, 2), RED).unwrap();
        assert_eq!(ceiling.pixels().lit(), vec![2]);
        assert_eq!(ceiling.get((0, 2)).unwrap(), Some(RED));

        ceiling.set(1, BLUE).unwrap();
        assert_eq!(ceiling.pixels().lit(), vec![2, 4, 5, 6, 7]);
    }

    #[test]
    fn test_row_get_rejects_bare_row() {
        let mut ceiling = small(&[4, 4]);
        ceiling.use_row();
        assert!(matches!(
            ceiling.get(1),
            Err(KeyError::Unsupported {
                access: Access::Get,
                ..
            })
        ));
    }

    #[test]
    fn test_rows_only_under_row_addressing() {
        let mut ceiling = small(&[4, 6]);
        assert_eq!(ceiling.rows(), None);
        ceiling.use_row();
        assert_eq!(ceiling.rows(), Some(&[4, 6][..]));
    }

    #[test]
    fn test_cartesian_point_round_trip() {
        let mut ceiling = installed();
        ceiling.use_cartesian();

        ceiling.set((0.5, 0.5), RED).unwrap();
        assert_eq!(ceiling.pixels().lit(), vec![CENTRE_LIGHT]);
        assert_eq!(ceiling.get((0.5, 0.5)).unwrap(), Some(RED));
        assert!(ceiling.spatial_index().is_some());
    }

    #[test]
    fn test_cartesian_miss_is_none() {
        let mut ceiling = installed();
        ceiling.use_strategy(Strategy::Cartesian { search_range: 0.01 });

        assert_eq!(ceiling.get((0.99, 0.99)).unwrap(), None);
        ceiling.set((0.99, 0.99), RED).unwrap();
        assert!(ceiling.pixels().lit().is_empty());
    }

    #[test]
    fn test_cartesian_area_includes_border() {
        let mut ceiling = small(&[4, 4]);
        ceiling.use_cartesian();

        // Lights 0..=2 sit on the bottom edge, light 2 on the right border.
        ceiling.set(Key::area((0.0, 0.0), (0.5, 0.3)), RED).unwrap();
        assert_eq!(ceiling.pixels().lit(), vec![0, 1, 2]);
    }

    #[test]
    fn test_cartesian_area_corners_in_any_order() {
        let mut a = small(&[4, 4]);
        let mut b = small(&[4, 4]);
        a.use_cartesian();
        b.use_cartesian();

        a.set(Key::area((0.0, 0.0), (0.6, 0.6)), RED).unwrap();
        b.set(Key::area((0.6, 0.6), (0.0, 0.0)), RED).unwrap();
        assert_eq!(a.pixels().lit(), b.pixels().lit());
    }

    #[test]
    fn test_degenerate_area_is_noop() {
        let mut ceiling = small(&[4, 4]);
        ceiling.use_cartesian();
        ceiling.set(Key::area((0.0, 0.0), (0.5, 0.0)), RED).unwrap();
        assert!(ceiling.pixels().lit().is_empty());
    }

    #[test]
    fn test_cartesian_get_rejects_area() {
        let mut ceiling = small(&[4, 4]);
        ceiling.use_cartesian();
        assert!(ceiling.get(Key::area((0.0, 0.0), (1.0, 1.0))).is_err());
    }

    #[test]
    fn test_polar_zero_radius_hits_origin() {
        let mut ceiling = installed();
        ceiling.use_polar();
        for angle in [0.0, 45.0, 190.0, 359.0, 720.0] {
            ceiling.clear(false).unwrap();
            ceiling.set(Key::polar(0.0, angle), RED).unwrap();
            assert_eq!(ceiling.pixels().lit(), vec![CENTRE_LIGHT], "angle {angle}");
        }
    }

    #[test]
    fn test_polar_fill_ignores_origin() {
        let mut a = installed();
        let mut b = installed();
        a.use_polar();
        b.use_strategy(Strategy::Polar {
            origin: (0.1, 0.9),
            search_range: 0.2,
        });

        a.set(Key::fill(0.3, 0.3, 0.15), RED).unwrap();
        b.set(Key::fill(0.3, 0.3, 0.15), RED).unwrap();
        assert!(!a.pixels().lit().is_empty());
        assert_eq!(a.pixels().lit(), b.pixels().lit());
    }

    #[test]
    fn test_zero_fill_is_noop() {
        let mut ceiling = installed();
        ceiling.use_polar();
        ceiling.set(Key::fill(0.5, 0.5, 0.0), RED).unwrap();
        ceiling.set(Key::fill(0.5, 0.5, -0.3), RED).unwrap();
        assert!(ceiling.pixels().lit().is_empty());
    }

    #[test]
    fn test_fractional_point_spreads_and_fades() {
        let mut ceiling = installed();
        ceiling.use_fractional_cartesian();
        ceiling.set((0.5, 0.5), Color::new(200, 200, 200)).unwrap();

        let lit = ceiling.pixels().lit();
        assert!(lit.len() > 1);
        assert_eq!(ceiling.get_by_index(CENTRE_LIGHT as i64), Color::new(200, 200, 200));
        let leds = ceiling.spatial_index().unwrap().leds().to_vec();
        for index in lit {
            assert!(leds[index].distance_to(0.5, 0.5) < 0.2);
        }
    }

    #[test]
    fn test_fractional_get_reads_nearest() {
        let mut ceiling = installed();
        ceiling.use_fractional_polar();
        ceiling.set_by_index(CENTRE_LIGHT as i64, BLUE);
        assert_eq!(ceiling.get(Key::polar(0.0, 0.0)).unwrap(), Some(BLUE));
    }

    #[test]
    fn test_fractional_set_never_darkens() {
        let mut ceiling = installed();
        ceiling.fill(Color::new(90, 90, 90));
        ceiling.use_fractional_cartesian();
        ceiling.set((0.3, 0.4), RED).unwrap();

        for color in ceiling.pixels().colors() {
            assert!(color.r >= 90 && color.g >= 90 && color.b >= 90);
        }
    }

    #[test]
    fn test_set_all_in_radius_works_under_any_strategy() {
        let mut ceiling = installed();
        ceiling.set_all_in_radius((0.5, 0.5), 0.1, RED);
        assert!(ceiling.pixels().lit().contains(&CENTRE_LIGHT));
        assert_eq!(ceiling.strategy(), Strategy::Sequential);
    }

    #[test]
    fn test_with_strategy_restores_previous() {
        let mut ceiling = installed();
        ceiling.use_row();
        let found = ceiling.with_strategy(Strategy::cartesian(), |c| {
            assert_eq!(c.strategy_kind(), StrategyKind::Cartesian);
            c.get((0.5, 0.5))
        });

        assert_eq!(found.unwrap(), Some(DARK));
        assert_eq!(ceiling.strategy(), Strategy::Row);
    }

    #[test]
    fn test_scoped_guard_restores_on_early_return() {
        fn paint_centre(ceiling: &mut Ceiling<MemoryPixels>) -> Result<(), KeyError> {
            let mut polar = ceiling.scoped(Strategy::polar());
            polar.set(Key::polar(0.0, 0.0), RED)?;
            // Sequential keys are rejected under polar addressing.
            polar.set(3, RED)?;
            Ok(())
        }

        let mut ceiling = installed();
        assert!(paint_centre(&mut ceiling).is_err());
        assert_eq!(ceiling.strategy(), Strategy::Sequential);
        assert_eq!(ceiling.pixels().lit(), vec![CENTRE_LIGHT]);
    }

    #[test]
    fn test_with_strategy_restores_on_panic() {
        let mut ceiling = installed();
        let result = catch_unwind(AssertUnwindSafe(|| {
            ceiling.with_strategy(Strategy::fractional_polar(), |c| {
                if c.strategy_kind() == StrategyKind::FractionalPolar {
                    panic!("animation failed");
                }
            })
        }));

        assert!(result.is_err());
        assert_eq!(ceiling.strategy(), Strategy::Sequential);
    }

    #[test]
    fn test_prepare_for_transfer_rebuilds_lazily() {
        let mut ceiling = installed();
        ceiling.use_cartesian();
        ceiling.set((0.5, 0.5), RED).unwrap();

        ceiling.prepare_for_transfer();
        assert!(ceiling.spatial_index().is_none());

        assert_eq!(ceiling.get((0.5, 0.5)).unwrap(), Some(RED));
        assert!(ceiling.spatial_index().is_some());
    }

    #[test]
    fn test_set_layout_checks_length_and_rebuilds() {
        let mut ceiling = small(&[4, 4]);
        ceiling.use_cartesian();
        ceiling.get((0.0, 0.0)).unwrap();

        assert_eq!(
            ceiling.set_layout(vec![3, 3]),
            Err(ConfigError::LengthMismatch {
                layout: 6,
                pixels: 8
            })
        );
        assert!(ceiling.spatial_index().is_some());

        ceiling.set_layout(vec![2, 3, 3]).unwrap();
        assert!(ceiling.spatial_index().is_none());
        ceiling.get((0.0, 0.0)).unwrap();
        assert_eq!(ceiling.spatial_index().unwrap().layout().rows(), &[2, 3, 3]);
    }

    #[test]
    fn test_clear_flushes_when_asked() {
        let mut ceiling = small(&[4, 4]);
        ceiling.fill(RED);
        ceiling.clear(false).unwrap();
        assert_eq!(ceiling.pixels().shows(), 0);
        assert!(ceiling.pixels().lit().is_empty());

        ceiling.clear(true).unwrap();
        assert_eq!(ceiling.pixels().shows(), 1);
    }
}
