//! Real platform implementation reading the operating system wall clock.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::pal::abstractions::Platform;

/// Real implementation of the platform abstraction using [`SystemTime`].
#[derive(Debug, Clone)]
pub(crate) struct RealPlatform;

impl Platform for RealPlatform {
    #[cfg_attr(test, mutants::skip)] // The real clock cannot be pinned to an expected value.
    fn now_nanos(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since_epoch) => i64::try_from(since_epoch.as_nanos()).unwrap_or(i64::MAX),
            Err(before_epoch) => i64::try_from(before_epoch.duration().as_nanos())
                .map_or(i64::MIN, |nanos| nanos.wrapping_neg()),
        }
    }
}
