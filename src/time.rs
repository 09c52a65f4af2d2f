//! Monotonic time sources for the analysis pipeline.
//!
//! The driver stamps every tick through a [TimeSource] so tests can drive the
//! refractory gate, intensity decay, and throttling deterministically.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Trait representing a monotonic time source used for tick timestamps.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default time source backed by `Instant::now`.
#[derive(Default)]
pub struct SystemTimeSource {
    _unit: (),
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced time source for deterministic tests and fixtures.
pub struct ManualTimeSource {
    current: Mutex<Instant>,
}

impl ManualTimeSource {
    pub fn new(start: Instant) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Advance the clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut guard = self.current.lock().unwrap();
        *guard += delta;
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_time_source_advances() {
        let source = ManualTimeSource::default();
        let before = source.now();
        source.advance(Duration::from_millis(300));
        let after = source.now();
        assert_eq!(after.duration_since(before), Duration::from_millis(300));
    }

    #[test]
    fn test_system_time_source_is_monotonic() {
        let source = SystemTimeSource::default();
        let a = source.now();
        let b = source.now();
        assert!(b >= a);
    }
}
