//! Timers persisted as one small file per timestamp.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::warn;

use crate::pal::{Platform, PlatformFacade};
use crate::{Error, Result, TimerDelta, TimerDirectory, TimestampRole};

const TIMESTAMP_LEN: usize = size_of::<i64>();

/// Named timers whose timestamps live in files under a [`TimerDirectory`].
///
/// Each timestamp is stored as 8 little-endian bytes in `<dir>/<name>_start` or
/// `<dir>/<name>_end`. Because the state lives on disk, a timer started by one process can be
/// polled, ended or queried by another, and timers survive process restarts.
///
/// [`start()`][Self::start] and [`end()`][Self::end] overwrite any existing file, so timers
/// left behind by an earlier run are simply restarted.
///
/// # Examples
///
/// ```
/// use interval_timers::{FileTimerStore, TimerDelta, TimerDirectory};
///
/// let temp = tempfile::tempdir().unwrap();
/// let store = FileTimerStore::new(TimerDirectory::new(temp.path()).unwrap());
///
/// store.start("job").unwrap();
/// assert_eq!(store.delta("job"), TimerDelta::NotEnded);
///
/// store.end("job").unwrap();
/// assert!(store.delta("job").elapsed().is_some());
///
/// store.delete("job").unwrap();
/// ```
#[derive(Debug)]
pub struct FileTimerStore {
    directory: TimerDirectory,
    platform: PlatformFacade,
}

impl FileTimerStore {
    /// Creates a store rooted at the given directory, reading the system clock.
    #[must_use]
    pub fn new(directory: TimerDirectory) -> Self {
        Self::with_platform(directory, PlatformFacade::real())
    }

    pub(crate) fn with_platform(directory: TimerDirectory, platform: PlatformFacade) -> Self {
        Self {
            directory,
            platform,
        }
    }

    /// The directory holding the timer files.
    #[must_use]
    pub fn directory(&self) -> &TimerDirectory {
        &self.directory
    }

    /// Writes the current time as the start of the named timer, replacing any previous start.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn start(&self, name: &str) -> Result<()> {
        self.write(name, TimestampRole::Start, self.platform.now_nanos())
    }

    /// Writes the current time as the end of the named timer, replacing any previous end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn end(&self, name: &str) -> Result<()> {
        self.write(name, TimestampRole::End, self.platform.now_nanos())
    }

    /// Nanoseconds elapsed since the named timer was started.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if no start file exists, or an I/O or
    /// [`Error::CorruptTimerFile`] error if it cannot be read.
    pub fn poll(&self, name: &str) -> Result<i64> {
        let start = self.running_start(name)?;
        Ok(self.platform.now_nanos().wrapping_sub(start))
    }

    /// Restarts the named timer from now and returns the nanoseconds elapsed before the restart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if no start file exists, or an I/O error.
    pub fn reset(&self, name: &str) -> Result<i64> {
        let start = self.running_start(name)?;
        let now = self.platform.now_nanos();

        self.write(name, TimestampRole::Start, now)?;
        Ok(now.wrapping_sub(start))
    }

    /// Removes the named timer's files and returns the nanoseconds elapsed since it was started.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if no start file exists, or an I/O error.
    pub fn stop(&self, name: &str) -> Result<i64> {
        let start = self.running_start(name)?;
        let now = self.platform.now_nanos();

        self.delete(name)?;
        Ok(now.wrapping_sub(start))
    }

    /// Removes the named timer's start file and, if present, its end file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if no start file exists, or an I/O error.
    pub fn delete(&self, name: &str) -> Result<()> {
        if !remove_if_exists(&self.directory.timestamp_path(name, TimestampRole::Start))? {
            return Err(Error::NotRunning {
                name: name.to_string(),
            });
        }

        remove_if_exists(&self.directory.timestamp_path(name, TimestampRole::End))?;
        Ok(())
    }

    /// Removes whichever of the named timer's files exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if an existing file cannot be removed.
    pub fn delete_if_exists(&self, name: &str) -> Result<()> {
        remove_if_exists(&self.directory.timestamp_path(name, TimestampRole::Start))?;
        remove_if_exists(&self.directory.timestamp_path(name, TimestampRole::End))?;
        Ok(())
    }

    /// Interval between the stored start and end of the named timer.
    ///
    /// A timestamp file that cannot be read counts as absent, so this never fails.
    #[must_use]
    pub fn delta(&self, name: &str) -> TimerDelta {
        let start = self.read_or_absent(name, TimestampRole::Start);
        if start.is_none() {
            return TimerDelta::NotStarted;
        }

        TimerDelta::between(start, self.read_or_absent(name, TimestampRole::End))
    }

    /// Reads one timestamp of the named timer, or `None` if its file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file exists but cannot be read, or
    /// [`Error::CorruptTimerFile`] if it does not hold exactly 8 bytes.
    pub fn read(&self, name: &str, role: TimestampRole) -> Result<Option<i64>> {
        let path = self.directory.timestamp_path(name, role);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(Error::io(path.display().to_string(), error)),
        };

        let Ok(timestamp) = <[u8; TIMESTAMP_LEN]>::try_from(bytes.as_slice()) else {
            return Err(Error::CorruptTimerFile {
                path,
                len: bytes.len(),
            });
        };

        Ok(Some(i64::from_le_bytes(timestamp)))
    }

    fn write(&self, name: &str, role: TimestampRole, timestamp: i64) -> Result<()> {
        let path = self.directory.timestamp_path(name, role);

        fs::write(&path, timestamp.to_le_bytes())
            .map_err(|error| Error::io(path.display().to_string(), error))
    }

    fn running_start(&self, name: &str) -> Result<i64> {
        self.read(name, TimestampRole::Start)?
            .ok_or_else(|| Error::NotRunning {
                name: name.to_string(),
            })
    }

    fn read_or_absent(&self, name: &str, role: TimestampRole) -> Option<i64> {
        self.read(name, role).unwrap_or_else(|error| {
            warn!(name, ?role, %error, "unreadable file timer treated as absent");
            None
        })
    }
}

/// Returns whether a file was removed.
fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
        Err(error) => Err(Error::io(path.display().to_string(), error)),
    }
}
