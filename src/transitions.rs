//! Ready-made animations that clear whatever is on the ceiling.
//!
//! Both run for one interval of the [`Scheduler`](crate::Scheduler) and stop
//! when it is reached, so build the scheduler with `Some(duration())`.

use std::convert::Infallible;

use crate::blend::{self, ChannelRounding};
use crate::ceiling::Ceiling;
use crate::config::ConfigError;
use crate::render::{Animation, Flow, RenderState};
use crate::{Color, PixelBuffer};

/// Share of the starting brightness left when a fade completes.
const FADE_TARGET: f32 = 0.001;

/// Fill radius of a [`CircleOut`] when its interval completes.
const CIRCLE_MAX_RADIUS: f32 = 0.7;

/// Width of the lit ring trailing the edge of a [`CircleOut`].
const CIRCLE_RING_WIDTH: f32 = 0.05;

fn check_duration(duration: f32) -> Result<(), ConfigError> {
    if duration > 0.0 && duration.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Interval(duration))
    }
}

/// Fades every light exponentially towards black.
#[derive(Debug, Clone)]
pub struct FadeOut {
    duration: f32,
    running: bool,
}

impl FadeOut {
    pub fn new(duration: f32) -> Result<Self, ConfigError> {
        check_duration(duration)?;
        Ok(Self {
            duration,
            running: true,
        })
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }
}

impl<P: PixelBuffer> Animation<P> for FadeOut {
    type Error = Infallible;

    fn render(
        &mut self,
        delta: f32,
        _: &RenderState,
        ceiling: &mut Ceiling<P>,
    ) -> Result<Flow, Self::Error> {
        let factor = FADE_TARGET.powf(delta / self.duration);
        for index in 0..ceiling.number_lights() as i64 {
            let dimmed = blend::scale(ceiling.get_by_index(index), factor, ChannelRounding::Truncate);
            ceiling.set_by_index(index, dimmed);
        }
        Ok(Flow::from(self.running))
    }

    fn interval_reached(&mut self, _: &mut Ceiling<P>) -> Result<(), Self::Error> {
        self.running = false;
        Ok(())
    }
}

/// Grows a ring of `color` out of the centre, clearing everything inside it.
///
/// The final frame turns every light off.
#[derive(Debug, Clone)]
pub struct CircleOut {
    duration: f32,
    color: Color,
    center: (f32, f32),
    running: bool,
}

impl CircleOut {
    pub fn new(duration: f32, color: Color) -> Result<Self, ConfigError> {
        check_duration(duration)?;
        Ok(Self {
            duration,
            color,
            center: (0.5, 0.5),
            running: true,
        })
    }

    /// Grow the circle from `center` instead of the middle of the ceiling.
    pub fn with_center(mut self, center: (f32, f32)) -> Self {
        self.center = center;
        self
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }
}

impl<P: PixelBuffer> Animation<P> for CircleOut {
    type Error = Infallible;

    fn render(
        &mut self,
        _: f32,
        state: &RenderState,
        ceiling: &mut Ceiling<P>,
    ) -> Result<Flow, Self::Error> {
        if !self.running {
            ceiling.fill(Color::default());
            return Ok(Flow::Stop);
        }

        let fill_radius = CIRCLE_MAX_RADIUS * state.progress();
        ceiling.set_all_in_radius(self.center, fill_radius, self.color);
        ceiling.set_all_in_radius(
            self.center,
            fill_radius - CIRCLE_RING_WIDTH,
            Color::default(),
        );
        Ok(Flow::Continue)
    }

    fn interval_reached(&mut self, _: &mut Ceiling<P>) -> Result<(), Self::Error> {
        self.running = false;
        Ok(())
    }
}
