pub mod addressing;
pub mod blend;
pub mod ceiling;
pub mod config;
pub mod context;
pub mod layout;
pub mod render;
pub mod spatial;
pub mod transitions;

pub use addressing::{Key, KeyError, Strategy, StrategyKind};
pub use ceiling::{Ceiling, StrategyGuard};
pub use config::{CeilingConfig, ConfigError};
pub use render::{Animation, Flow, RenderState, Scheduler};

/// 8-bit-per-channel RGB color written to every light.
pub use smart_leds::RGB8 as Color;

/// Trait for the strip of lights the ceiling writes into.
///
/// Abstracts over a real LED driver and host-side buffers, providing the
/// uniform interface the addressing strategies write through. Writes are
/// buffered until [`PixelBuffer::show`] flushes them.
pub trait PixelBuffer {
    /// Error type for flush failures.
    type Error: std::fmt::Debug + std::fmt::Display;

    /// Number of lights on the strip.
    fn len(&self) -> usize;

    /// Current color of the light at `index`.
    ///
    /// Callers keep `index` below [`PixelBuffer::len`].
    fn get(&self, index: usize) -> Color;

    /// Buffer a new color for the light at `index`.
    fn set(&mut self, index: usize, color: Color);

    /// Buffer `color` for every light.
    fn fill(&mut self, color: Color) {
        for index in 0..self.len() {
            self.set(index, color);
        }
    }

    /// Push buffered colors out to the lights.
    fn show(&mut self) -> Result<(), Self::Error>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub mod mock;
