use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when operating timers or reconstructing an event log.
///
/// Most variants are usage faults: the caller drove a timer or sink through an invalid
/// lifecycle transition. These indicate a bug at the call site and are not worth retrying.
/// Incomplete timers are not errors; query them through the `delta()` methods, which return
/// a [`TimerDelta`][crate::TimerDelta] instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A timer was started while it was already running.
    #[error("attempted to start running timer '{name}'")]
    AlreadyRunning {
        /// Name of the timer.
        name: String,
    },

    /// A timer was ended after an end had already been recorded for it.
    #[error("attempted to end stopped timer '{name}'")]
    AlreadyEnded {
        /// Name of the timer.
        name: String,
    },

    /// A timer was polled, reset, stopped or deleted without having been started.
    #[error("timer '{name}' is not running")]
    NotRunning {
        /// Name of the timer.
        name: String,
    },

    /// An event log operation required an active sink but none was set.
    #[error("no event log sink is active")]
    NoActiveSink,

    /// The configured timer directory does not exist or is not a directory.
    #[error("'{}' is not a valid timer directory", path.display())]
    InvalidDirectory {
        /// The rejected path.
        path: PathBuf,
    },

    /// A file or sink could not be created, opened, read or written.
    #[error("I/O failure on '{target}': {source}")]
    Io {
        /// Path or label of the file or sink that failed.
        target: String,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// An event log source does not have the shape of a sequence of records.
    #[error("event log source '{source_name}' is malformed at byte {offset}: {problem}")]
    MalformedSource {
        /// Path or label identifying the source.
        source_name: String,

        /// Byte offset at which decoding failed.
        offset: usize,

        /// A human-readable description of the problem.
        problem: String,
    },

    /// A file timer exists but does not hold exactly one 8-byte timestamp.
    #[error("file timer '{}' holds {len} bytes instead of 8", path.display())]
    CorruptTimerFile {
        /// Path of the timer file.
        path: PathBuf,

        /// Length of the file as read.
        len: usize,
    },
}

impl Error {
    /// Whether this error is a lifecycle usage fault (a bug at the call site) as opposed to
    /// an I/O, configuration or data-integrity failure.
    #[must_use]
    pub fn is_usage_fault(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRunning { .. }
                | Self::AlreadyEnded { .. }
                | Self::NotRunning { .. }
                | Self::NoActiveSink
        )
    }

    pub(crate) fn io(target: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            target: target.into(),
            source,
        }
    }

    pub(crate) fn malformed(
        source_name: impl Into<String>,
        offset: usize,
        problem: impl Into<String>,
    ) -> Self {
        Self::MalformedSource {
            source_name: source_name.into(),
            offset,
            problem: problem.into(),
        }
    }
}

/// A specialized `Result` type for timer operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn usage_faults_are_classified() {
        assert!(
            Error::AlreadyRunning {
                name: "a".to_string()
            }
            .is_usage_fault()
        );
        assert!(Error::NoActiveSink.is_usage_fault());
        assert!(!Error::io("x", io::Error::other("disk full")).is_usage_fault());
        assert!(!Error::malformed("x", 3, "truncated").is_usage_fault());
    }

    #[test]
    fn messages_identify_the_subject() {
        let error = Error::NotRunning {
            name: "t3".to_string(),
        };
        assert_eq!(error.to_string(), "timer 't3' is not running");

        let error = Error::malformed("run.log", 17, "timestamp is truncated");
        assert_eq!(
            error.to_string(),
            "event log source 'run.log' is malformed at byte 17: timestamp is truncated"
        );
    }
}
