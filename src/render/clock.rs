use std::time::{Duration, Instant};

/// Time source for the [`Scheduler`](super::Scheduler).
///
/// Abstracts over the wall clock and manually stepped clocks, so render
/// loops can be driven deterministically.
pub trait Clock {
    /// Time elapsed since the clock was created. Never decreases.
    fn elapsed(&self) -> Duration;

    /// Block until roughly `duration` has passed.
    fn sleep(&mut self, duration: Duration);
}

/// Wall-clock time measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when told to.
///
/// [`Clock::sleep`] advances it by the requested duration, so a render loop
/// run against it completes instantly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.advance(duration);
    }
}
