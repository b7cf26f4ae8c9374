//! Fake platform implementation for testing.

use std::sync::{Arc, Mutex};

use crate::pal::abstractions::Platform;

/// Fake implementation of the platform abstraction for testing.
///
/// Multiple clones of the same `FakePlatform` share one clock reading, so a test can keep a
/// clone and move the clock while a timer owns another clone.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    now: Arc<Mutex<i64>>,
}

impl FakePlatform {
    /// Creates a fake clock that reads zero.
    pub(crate) fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a fake clock with the given reading.
    pub(crate) fn starting_at(now: i64) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Sets the reading seen by all clones.
    pub(crate) fn set_now(&self, now: i64) {
        *self
            .now
            .lock()
            .expect("FakePlatform state lock should not be poisoned") = now;
    }

    /// Moves the reading seen by all clones forward by `nanos`.
    pub(crate) fn advance(&self, nanos: i64) {
        let mut now = self
            .now
            .lock()
            .expect("FakePlatform state lock should not be poisoned");
        *now = now.wrapping_add(nanos);
    }
}

impl Platform for FakePlatform {
    fn now_nanos(&self) -> i64 {
        *self
            .now
            .lock()
            .expect("FakePlatform state lock should not be poisoned")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn initializes_with_zero() {
        assert_eq!(FakePlatform::new().now_nanos(), 0);
    }

    #[test]
    fn set_and_advance() {
        let platform = FakePlatform::starting_at(100);
        assert_eq!(platform.now_nanos(), 100);

        platform.advance(50);
        assert_eq!(platform.now_nanos(), 150);

        platform.set_now(-7);
        assert_eq!(platform.now_nanos(), -7);
    }

    #[test]
    fn shared_state_between_clones() {
        let platform1 = FakePlatform::new();
        let platform2 = platform1.clone();

        platform1.set_now(1_000);
        assert_eq!(platform2.now_nanos(), 1_000);

        platform2.advance(1);
        assert_eq!(platform1.now_nanos(), 1_001);
    }
}
