use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// Brightness a fresh context starts with.
pub const DEFAULT_BRIGHTNESS: u8 = 255;

/// What became of the most recently started animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    /// Nothing has been started yet.
    #[default]
    Idle,
    Running,
    /// Stopped on its own.
    Finished,
    /// Returned an error or panicked.
    Crashed,
    /// Stopped from outside.
    Terminated,
}

/// Misuse of the [`AppContext`] lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("animation {current:?} is still running")]
    AlreadyRunning { current: String },
    #[error("animation {name:?} is not the one running")]
    NotCurrent { name: String },
}

/// Point-in-time copy of the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub current: Option<String>,
    pub status: RunStatus,
    pub brightness: u8,
}

#[derive(Debug)]
struct State {
    current: Option<String>,
    status: RunStatus,
    brightness: u8,
}

/// Which animation runs and how bright the ceiling is, shared by reference
/// between the control surface and the animation runner.
#[derive(Debug)]
pub struct AppContext {
    state: Mutex<State>,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(DEFAULT_BRIGHTNESS)
    }
}

impl AppContext {
    pub fn new(brightness: u8) -> Self {
        Self {
            state: Mutex::new(State {
                current: None,
                status: RunStatus::Idle,
                brightness,
            }),
        }
    }

    /// Every update leaves the state consistent, so a panic elsewhere while
    /// holding the lock does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `name` as the running animation.
    pub fn start(&self, name: impl Into<String>) -> Result<(), ContextError> {
        let mut state = self.lock();
        if state.status == RunStatus::Running {
            return Err(ContextError::AlreadyRunning {
                current: state.current.clone().unwrap_or_default(),
            });
        }
        let name = name.into();
        log::info!("starting animation {name:?}");
        state.current = Some(name);
        state.status = RunStatus::Running;
        Ok(())
    }

    /// Record that `name` stopped on its own.
    pub fn finish(&self, name: &str) -> Result<(), ContextError> {
        self.settle(name, RunStatus::Finished)
    }

    /// Record that `name` failed.
    pub fn crash(&self, name: &str, reason: impl std::fmt::Display) -> Result<(), ContextError> {
        log::warn!("animation {name:?} crashed: {reason}");
        self.settle(name, RunStatus::Crashed)
    }

    /// Stop whatever is running. Returns its name, if anything was.
    pub fn terminate(&self) -> Option<String> {
        let mut state = self.lock();
        if state.status != RunStatus::Running {
            return None;
        }
        state.status = RunStatus::Terminated;
        log::info!("terminated animation {:?}", state.current);
        state.current.clone()
    }

    fn settle(&self, name: &str, status: RunStatus) -> Result<(), ContextError> {
        let mut state = self.lock();
        if state.status != RunStatus::Running || state.current.as_deref() != Some(name) {
            return Err(ContextError::NotCurrent {
                name: name.to_owned(),
            });
        }
        state.status = status;
        Ok(())
    }

    pub fn status(&self) -> RunStatus {
        self.lock().status
    }

    /// Name of the most recently started animation.
    pub fn current(&self) -> Option<String> {
        self.lock().current.clone()
    }

    pub fn brightness(&self) -> u8 {
        self.lock().brightness
    }

    /// Set the global brightness, clamped to `0..=255`. Returns the value applied.
    pub fn set_brightness(&self, brightness: i32) -> u8 {
        let clamped = brightness.clamp(0, i32::from(u8::MAX)) as u8;
        self.lock().brightness = clamped;
        log::debug!("brightness set to {clamped}");
        clamped
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            current: state.current.clone(),
            status: state.status,
            brightness: state.brightness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_lifecycle_start_finish() {
        let context = AppContext::default();
        assert_eq!(context.status(), RunStatus::Idle);

        context.start("rainbow").unwrap();
        assert_eq!(context.status(), RunStatus::Running);
        assert_eq!(context.current().as_deref(), Some("rainbow"));

        context.finish("rainbow").unwrap();
        assert_eq!(context.status(), RunStatus::Finished);
    }

    #[test]
    fn test_start_while_running_is_rejected() {
        let context = AppContext::default();
        context.start("rainbow").unwrap();
        assert_eq!(
            context.start("sparkle"),
            Err(ContextError::AlreadyRunning {
                current: "rainbow".to_owned()
            })
        );
    }

    #[test]
    fn test_finish_other_animation_is_rejected() {
        let context = AppContext::default();
        context.start("rainbow").unwrap();
        assert!(matches!(
            context.finish("sparkle"),
            Err(ContextError::NotCurrent { .. })
        ));
        assert_eq!(context.status(), RunStatus::Running);
    }

    #[test]
    fn test_crash_and_restart() {
        let context = AppContext::default();
        context.start("rainbow").unwrap();
        context.crash("rainbow", "index out of range").unwrap();
        assert_eq!(context.status(), RunStatus::Crashed);

        context.start("sparkle").unwrap();
        assert_eq!(context.current().as_deref(), Some("sparkle"));
    }

    #[test]
    fn test_terminate() {
        let context = AppContext::default();
        assert_eq!(context.terminate(), None);

        context.start("rainbow").unwrap();
        assert_eq!(context.terminate().as_deref(), Some("rainbow"));
        assert_eq!(context.status(), RunStatus::Terminated);
        assert!(context.finish("rainbow").is_err());
    }

    #[test_case(128 => 128; "in range")]
    #[test_case(-20 => 0; "below")]
    #[test_case(400 => 255; "above")]
    fn test_brightness_is_clamped(value: i32) -> u8 {
        let context = AppContext::new(10);
        let applied = context.set_brightness(value);
        assert_eq!(context.brightness(), applied);
        applied
    }

    #[test]
    fn test_shared_across_threads() {
        let context = AppContext::default();
        std::thread::scope(|scope| {
            scope.spawn(|| context.start("rainbow").unwrap());
        });
        std::thread::scope(|scope| {
            scope.spawn(|| context.set_brightness(42));
        });

        assert_eq!(
            context.snapshot(),
            Snapshot {
                current: Some("rainbow".to_owned()),
                status: RunStatus::Running,
                brightness: 42,
            }
        );
    }
}
