use thiserror::Error;

use crate::blend::{ChannelRounding, EffectRadius};
use crate::layout::RowLayout;

/// Row arrangement of the installed ceiling, nearest the connector first.
pub const CEILING_ROW_ARRANGEMENT: [usize; 7] = [
    20, // ---
    40, // \
    20, // ---
    40, // \
    20, // ---
    40, // \
    20, // ---
];

/// Default frames per second for the render scheduler.
pub const DEFAULT_FPS: f32 = 60.0;

/// Default nearest-light search range for point addressing.
pub const DEFAULT_SEARCH_RANGE: f32 = 0.2;

/// Default polar origin, the centre of the addressing square.
pub const DEFAULT_ORIGIN: (f32, f32) = (0.5, 0.5);

/// Configuration that cannot yield a consistent mapping.
///
/// Always raised while constructing, never while querying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("row layout must contain at least one row")]
    EmptyLayout,
    #[error("row {row} has no lights")]
    EmptyRow { row: usize },
    #[error("effect radius must be positive, got {0}")]
    EffectRadius(f32),
    #[error("frame rate must be positive, got {0}")]
    FrameRate(f32),
    #[error("interval must be positive, got {0}")]
    Interval(f32),
    #[error("row layout holds {layout} lights but the pixel buffer holds {pixels}")]
    LengthMismatch { layout: usize, pixels: usize },
}

/// Settings for a [`Ceiling`](crate::Ceiling) and its render loop.
#[derive(Debug, Clone, PartialEq)]
pub struct CeilingConfig {
    pub rows: Vec<usize>,
    pub fps: f32,
    pub search_range: f32,
    pub effect_radius: f32,
    pub origin: (f32, f32),
    pub rounding: ChannelRounding,
}

impl Default for CeilingConfig {
    fn default() -> Self {
        Self {
            rows: CEILING_ROW_ARRANGEMENT.to_vec(),
            fps: DEFAULT_FPS,
            search_range: DEFAULT_SEARCH_RANGE,
            effect_radius: EffectRadius::DEFAULT.get(),
            origin: DEFAULT_ORIGIN,
            rounding: ChannelRounding::default(),
        }
    }
}

impl CeilingConfig {
    pub fn with_rows(mut self, rows: impl Into<Vec<usize>>) -> Self {
        self.rows = rows.into();
        self
    }

    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_search_range(mut self, search_range: f32) -> Self {
        self.search_range = search_range;
        self
    }

    pub fn with_effect_radius(mut self, effect_radius: f32) -> Self {
        self.effect_radius = effect_radius;
        self
    }

    pub fn with_origin(mut self, origin: (f32, f32)) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_rounding(mut self, rounding: ChannelRounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Number of lights the configured rows add up to.
    pub fn number_lights(&self) -> usize {
        self.rows.iter().sum()
    }

    /// Check every setting and return the validated row layout.
    pub fn validate(&self) -> Result<RowLayout, ConfigError> {
        EffectRadius::new(self.effect_radius)?;
        if !(self.fps > 0.0 && self.fps.is_finite()) {
            return Err(ConfigError::FrameRate(self.fps));
        }
        RowLayout::new(self.rows.clone())
    }
}
