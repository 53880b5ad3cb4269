//! Fixed-step render loop.
//!
//! The [`Scheduler`] measures wall time between ticks and turns it into
//! whole frames of a fixed length, so an animation always sees the same
//! `delta` however jittery the host is. Each frame optionally advances a
//! repeating interval, renders and flushes the pixel buffer.

mod clock;

use std::fmt::{Debug, Display};
use std::time::Duration;

use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};

use crate::PixelBuffer;
use crate::ceiling::Ceiling;
use crate::config::ConfigError;

/// Frames caught up in one tick before the scheduler warns about falling behind.
const CATCH_UP_WARNING: u32 = 10;

/// Slack for float error when a tick lands exactly on a frame boundary.
const FRAME_EPSILON: f64 = 1e-9;

/// Timing handed to every render call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    interval: Option<f32>,
    elapsed: f32,
}

impl RenderState {
    /// Track a repeating `interval` in seconds, or nothing.
    pub fn new(interval: Option<f32>) -> Result<Self, ConfigError> {
        if let Some(interval) = interval
            && !(interval > 0.0 && interval.is_finite())
        {
            return Err(ConfigError::Interval(interval));
        }
        Ok(Self {
            interval,
            elapsed: 0.0,
        })
    }

    #[inline]
    pub fn interval(&self) -> Option<f32> {
        self.interval
    }

    /// Seconds since the interval last restarted.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Share of the current interval that has passed, in `0.0..=1.0`.
    ///
    /// Always `0.0` without an interval.
    pub fn progress(&self) -> f32 {
        match self.interval {
            Some(interval) => (self.elapsed / interval).clamp(0.0, 1.0),
            None => 0.0,
        }
    }

    /// Advance by one frame. Returns `true` when the interval boundary was
    /// reached, in which case the interval restarts from zero.
    fn advance(&mut self, delta: f32) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        self.elapsed += delta;
        if self.elapsed >= interval {
            self.elapsed = 0.0;
            return true;
        }
        false
    }
}

/// Whether the render loop should keep going after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl From<bool> for Flow {
    fn from(keep_going: bool) -> Self {
        if keep_going { Self::Continue } else { Self::Stop }
    }
}

/// Trait for anything the render loop can drive.
pub trait Animation<P: PixelBuffer> {
    /// Error type for failed frames.
    type Error: Debug + Display;

    /// Draw one frame `delta` seconds after the previous one.
    ///
    /// The scheduler flushes the ceiling after every frame.
    fn render(
        &mut self,
        delta: f32,
        state: &RenderState,
        ceiling: &mut Ceiling<P>,
    ) -> Result<Flow, Self::Error>;

    /// Called when the interval boundary is crossed, before the frame that
    /// crossed it is rendered.
    fn interval_reached(&mut self, _ceiling: &mut Ceiling<P>) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Failure while driving an animation. Never swallowed by the scheduler.
#[derive(Debug, Error)]
pub enum RenderError<A, D> {
    #[error("animation failed: {0}")]
    Animation(A),
    #[error("failed to show frame: {0}")]
    Flush(D),
}

/// Lifecycle of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Rendering,
    /// Terminal. Reached when the animation stops or fails.
    Stopped,
}

/// Fixed-step render loop with jitter-tolerant frame accumulation.
#[derive(Debug)]
pub struct Scheduler<C = SystemClock> {
    clock: C,
    frame: Duration,
    delta: f32,
    state: RenderState,
    /// Elapsed time not yet rendered, in frames.
    accumulated: f64,
    last_tick: Duration,
    phase: Phase,
    frames: u64,
}

impl Scheduler<SystemClock> {
    /// Run at `fps` frames per second on the wall clock.
    pub fn new(fps: f32, interval: Option<f32>) -> Result<Self, ConfigError> {
        Self::with_clock(fps, interval, SystemClock::new())
    }
}

impl<C: Clock> Scheduler<C> {
    pub fn with_clock(fps: f32, interval: Option<f32>, clock: C) -> Result<Self, ConfigError> {
        if !(fps > 0.0 && fps.is_finite()) {
            return Err(ConfigError::FrameRate(fps));
        }
        let state = RenderState::new(interval)?;
        let frame = Duration::try_from_secs_f64(1.0 / f64::from(fps))
            .map_err(|_| ConfigError::FrameRate(fps))?;

        Ok(Self {
            clock,
            frame,
            delta: frame.as_secs_f32(),
            state,
            accumulated: 0.0,
            last_tick: Duration::ZERO,
            phase: Phase::Idle,
            frames: 0,
        })
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Normalised progress through the current interval.
    #[inline]
    pub fn progress(&self) -> f32 {
        self.state.progress()
    }

    /// Fixed frame length in seconds, as passed to every render call.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Frames rendered so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Leave [`Phase::Idle`] and start measuring time.
    pub fn start(&mut self) {
        if self.phase != Phase::Idle {
            return;
        }
        self.last_tick = self.clock.elapsed();
        self.phase = Phase::Running;
        log::info!(
            "render loop started at {:.1} fps, interval {:?}",
            1.0 / self.frame.as_secs_f64(),
            self.state.interval()
        );
    }

    /// Render every whole frame that elapsed since the previous tick.
    ///
    /// Starts the scheduler if it is still idle. Once stopped, ticks do nothing.
    pub fn tick<P, A>(
        &mut self,
        animation: &mut A,
        ceiling: &mut Ceiling<P>,
    ) -> Result<Phase, RenderError<A::Error, P::Error>>
    where
        P: PixelBuffer,
        A: Animation<P>,
    {
        match self.phase {
            Phase::Stopped => return Ok(Phase::Stopped),
            Phase::Idle => self.start(),
            Phase::Running | Phase::Rendering => {}
        }

        let now = self.clock.elapsed();
        let since = now.saturating_sub(self.last_tick);
        self.last_tick = now;
        self.accumulated += since.as_secs_f64() / self.frame.as_secs_f64();

        let mut caught_up = 0;
        while self.accumulated >= 1.0 - FRAME_EPSILON {
            self.accumulated -= 1.0;
            caught_up += 1;

            self.phase = Phase::Rendering;
            match self.step(animation, ceiling) {
                Ok(Flow::Continue) => self.phase = Phase::Running,
                Ok(Flow::Stop) => {
                    self.stop();
                    break;
                }
                Err(e) => {
                    self.stop();
                    return Err(e);
                }
            }
        }

        if caught_up > CATCH_UP_WARNING {
            log::warn!("render loop fell behind, caught up {caught_up} frames in one tick");
        }
        Ok(self.phase)
    }

    /// Sleep until the next frame is due.
    pub fn wait(&mut self) {
        let since = self.clock.elapsed().saturating_sub(self.last_tick);
        let remaining = (1.0 - self.accumulated).max(0.0) * self.frame.as_secs_f64();
        let wait = Duration::from_secs_f64(remaining).saturating_sub(since);
        // Always move forward so a manual clock cannot stall the loop.
        self.clock.sleep(wait.max(Duration::from_nanos(1)));
    }

    /// Tick and wait until the animation stops or fails.
    pub fn run<P, A>(
        &mut self,
        animation: &mut A,
        ceiling: &mut Ceiling<P>,
    ) -> Result<(), RenderError<A::Error, P::Error>>
    where
        P: PixelBuffer,
        A: Animation<P>,
    {
        self.start();
        while self.tick(animation, ceiling)? != Phase::Stopped {
            self.wait();
        }
        Ok(())
    }

    fn step<P, A>(
        &mut self,
        animation: &mut A,
        ceiling: &mut Ceiling<P>,
    ) -> Result<Flow, RenderError<A::Error, P::Error>>
    where
        P: PixelBuffer,
        A: Animation<P>,
    {
        if self.state.advance(self.delta) {
            animation
                .interval_reached(ceiling)
                .map_err(RenderError::Animation)?;
        }
        let flow = animation
            .render(self.delta, &self.state, ceiling)
            .map_err(RenderError::Animation)?;
        ceiling.show().map_err(RenderError::Flush)?;
        self.frames += 1;
        Ok(flow)
    }

    fn stop(&mut self) {
        self.phase = Phase::Stopped;
        log::info!("render loop stopped after {} frames", self.frames);
    }
}
