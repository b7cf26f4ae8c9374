//! In-memory timers keyed by name.

use std::collections::HashMap;

use crate::pal::{Platform, PlatformFacade};
use crate::{Error, Result, TimerDelta};

/// In-memory table of named timers.
///
/// Each name maps to a start timestamp and, once ended, an end timestamp. The table supports
/// two styles of use that can be mixed freely:
///
/// * start/stop: [`start()`][Self::start] then [`poll()`][Self::poll],
///   [`reset()`][Self::reset] or [`stop()`][Self::stop], which report elapsed time directly;
/// * start/end: [`start()`][Self::start] and [`end()`][Self::end] record both endpoints and
///   [`delta()`][Self::delta] reports the interval between them.
///
/// The table is owned by the caller and is not internally synchronized.
///
/// # Examples
///
/// ```
/// use interval_timers::KeyedTimers;
///
/// let mut timers = KeyedTimers::new();
///
/// timers.start("parse").unwrap();
/// // Work happens here.
/// let elapsed_nanos = timers.stop("parse").unwrap();
/// assert!(elapsed_nanos >= 0);
///
/// // Starting a running timer is a usage fault.
/// timers.start("render").unwrap();
/// timers.start("render").unwrap_err();
/// ```
#[derive(Debug)]
pub struct KeyedTimers {
    starts: HashMap<String, i64>,
    ends: HashMap<String, i64>,
    platform: PlatformFacade,
}

impl KeyedTimers {
    /// Creates an empty table reading the system clock.
    #[expect(
        clippy::new_without_default,
        reason = "an empty table is created explicitly by its owning scope"
    )]
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform(PlatformFacade::real())
    }

    pub(crate) fn with_platform(platform: PlatformFacade) -> Self {
        Self {
            starts: HashMap::new(),
            ends: HashMap::new(),
            platform,
        }
    }

    /// Records the start of the named timer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRunning`] if the timer is already running.
    pub fn start(&mut self, name: &str) -> Result<()> {
        if self.starts.contains_key(name) {
            return Err(Error::AlreadyRunning {
                name: name.to_string(),
            });
        }

        self.starts
            .insert(name.to_string(), self.platform.now_nanos());
        Ok(())
    }

    /// Records the end of the named timer, for later retrieval via [`delta()`][Self::delta].
    ///
    /// The timer keeps running in the start/stop sense until it is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyEnded`] if an end is already recorded for the timer.
    pub fn end(&mut self, name: &str) -> Result<()> {
        if self.ends.contains_key(name) {
            return Err(Error::AlreadyEnded {
                name: name.to_string(),
            });
        }

        self.ends.insert(name.to_string(), self.platform.now_nanos());
        Ok(())
    }

    /// Nanoseconds elapsed since the named timer was started, without altering it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if the timer is not running.
    pub fn poll(&self, name: &str) -> Result<i64> {
        let start = self.running_start(name)?;
        Ok(self.platform.now_nanos().wrapping_sub(start))
    }

    /// Restarts the named timer from now and returns the nanoseconds elapsed before the restart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if the timer is not running.
    pub fn reset(&mut self, name: &str) -> Result<i64> {
        let now = self.platform.now_nanos();

        let start = self.starts.get_mut(name).ok_or_else(|| Error::NotRunning {
            name: name.to_string(),
        })?;

        let elapsed = now.wrapping_sub(*start);
        *start = now;
        Ok(elapsed)
    }

    /// Removes the named timer and returns the nanoseconds elapsed since it was started.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if the timer is not running.
    pub fn stop(&mut self, name: &str) -> Result<i64> {
        let now = self.platform.now_nanos();
        let start = self.remove(name)?;
        Ok(now.wrapping_sub(start))
    }

    /// Removes the named timer, including any recorded end, so the name can be started again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if the timer is not running.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.remove(name).map(|_| ())
    }

    /// Interval between the recorded start and end of the named timer.
    #[must_use]
    pub fn delta(&self, name: &str) -> TimerDelta {
        TimerDelta::between(
            self.starts.get(name).copied(),
            self.ends.get(name).copied(),
        )
    }

    /// Whether the named timer has been started and not yet stopped or deleted.
    #[must_use]
    pub fn is_running(&self, name: &str) -> bool {
        self.starts.contains_key(name)
    }

    /// Number of running timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// Whether no timers are running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    fn running_start(&self, name: &str) -> Result<i64> {
        self.starts.get(name).copied().ok_or_else(|| Error::NotRunning {
            name: name.to_string(),
        })
    }

    fn remove(&mut self, name: &str) -> Result<i64> {
        let start = self.starts.remove(name).ok_or_else(|| Error::NotRunning {
            name: name.to_string(),
        })?;

        self.ends.remove(name);
        Ok(start)
    }
}
