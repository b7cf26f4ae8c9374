use std::fmt;

/// Sentinel reported by [`TimerDelta::to_sentinel()`] for a timer that was never started.
pub const NOT_STARTED: i64 = -1;

/// Sentinel reported by [`TimerDelta::to_sentinel()`] for a timer that was started but not ended.
pub const NOT_ENDED: i64 = -2;

/// Outcome of querying the elapsed time of a start/end timer.
///
/// Querying a timer that is not complete yet is a normal occurrence, so this is a value rather
/// than an error.
///
/// # Examples
///
/// ```
/// use interval_timers::{KeyedTimers, NOT_ENDED, TimerDelta};
///
/// let mut timers = KeyedTimers::new();
/// assert_eq!(timers.delta("load"), TimerDelta::NotStarted);
///
/// timers.start("load").unwrap();
/// assert_eq!(timers.delta("load").to_sentinel(), NOT_ENDED);
///
/// timers.end("load").unwrap();
/// assert!(timers.delta("load").elapsed().is_some());
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum TimerDelta {
    /// No start has been recorded.
    NotStarted,

    /// A start has been recorded but no end.
    NotEnded,

    /// Nanoseconds from start to end. May be negative if the host clock moved backwards.
    Elapsed(i64),
}

impl TimerDelta {
    /// The elapsed nanoseconds if the timer is complete.
    #[must_use]
    pub fn elapsed(self) -> Option<i64> {
        match self {
            Self::Elapsed(nanos) => Some(nanos),
            Self::NotStarted | Self::NotEnded => None,
        }
    }

    /// Flattens the outcome into the sentinel encoding: [`NOT_STARTED`], [`NOT_ENDED`] or the
    /// elapsed nanoseconds.
    ///
    /// A completed interval can itself be negative, so the sentinel encoding is ambiguous for
    /// such values. Prefer matching on the enum where that matters.
    #[must_use]
    pub fn to_sentinel(self) -> i64 {
        match self {
            Self::NotStarted => NOT_STARTED,
            Self::NotEnded => NOT_ENDED,
            Self::Elapsed(nanos) => nanos,
        }
    }

    pub(crate) fn between(start: Option<i64>, end: Option<i64>) -> Self {
        match (start, end) {
            (None, _) => Self::NotStarted,
            (Some(_), None) => Self::NotEnded,
            (Some(start), Some(end)) => Self::Elapsed(end.wrapping_sub(start)),
        }
    }
}

impl fmt::Display for TimerDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::NotEnded => write!(f, "not ended"),
            Self::Elapsed(nanos) => write!(f, "{nanos} ns"),
        }
    }
}
