use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Error, Result};

/// Which of a timer's two timestamps a file holds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum TimestampRole {
    /// The moment the timer was started.
    Start,

    /// The moment the timer was ended.
    End,
}

impl TimestampRole {
    /// File name suffix appended to the timer name.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Start => "_start",
            Self::End => "_end",
        }
    }
}

/// A validated base directory that roots file timers and default event log locations.
///
/// # Examples
///
/// ```
/// use interval_timers::{TimerDirectory, TimestampRole};
///
/// let temp = tempfile::tempdir().unwrap();
/// let dir = TimerDirectory::new(temp.path()).unwrap();
///
/// let start_file = dir.timestamp_path("compile", TimestampRole::Start);
/// assert!(start_file.ends_with("compile_start"));
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimerDirectory {
    path: PathBuf,
}

impl TimerDirectory {
    /// Validates that `path` exists and is a directory.
    ///
    /// Trailing path separators are normalized away.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDirectory`] if the path does not name an existing directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let is_dir = fs::metadata(path).is_ok_and(|metadata| metadata.is_dir());
        if !is_dir {
            return Err(Error::InvalidDirectory {
                path: path.to_path_buf(),
            });
        }

        let path: PathBuf = path.components().collect();
        debug!(path = %path.display(), "timer directory configured");

        Ok(Self { path })
    }

    /// The normalized directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the file that holds one timestamp of the named timer.
    #[must_use]
    pub fn timestamp_path(&self, name: &str, role: TimestampRole) -> PathBuf {
        self.path.join(format!("{name}{}", role.suffix()))
    }

    /// Default location for an event log file with the given file name.
    #[must_use]
    pub fn log_path(&self, file_name: &str) -> PathBuf {
        self.path.join(file_name)
    }
}
