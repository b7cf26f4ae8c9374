//! Buffered event log that accumulates summaries directly in memory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::mem;
use std::path::Path;

use tracing::debug;

use crate::pal::{Platform, PlatformFacade};
use crate::{Error, EventKind, EventRecorder, Result, SummaryTable, parse_to_table};

/// Records timer events straight into an in-memory [`SummaryTable`], skipping serialization.
///
/// This is the fast path for bracketing regions within one process. The buffer can later be
/// written out in the event log record format, merged with tables reconstructed elsewhere,
/// replaced wholesale or cleared.
///
/// # Examples
///
/// ```
/// use interval_timers::{BufferedLog, parse_bytes};
///
/// let mut log = BufferedLog::new();
/// log.record_start("request");
/// log.record_end("request");
///
/// // The buffer serializes to the same format as `LogWriter` output.
/// let mut bytes = Vec::new();
/// log.write_buffer(&mut bytes).unwrap();
/// assert_eq!(&parse_bytes("buffer", &bytes).unwrap(), log.buffer());
///
/// log.reset_buffer();
/// assert!(log.buffer().is_empty());
/// ```
#[derive(Debug)]
pub struct BufferedLog {
    buffer: SummaryTable,
    platform: PlatformFacade,
}

impl BufferedLog {
    /// Creates a log with an empty buffer.
    #[expect(
        clippy::new_without_default,
        reason = "each buffer is created explicitly by its owning scope"
    )]
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform(PlatformFacade::real())
    }

    pub(crate) fn with_platform(platform: PlatformFacade) -> Self {
        Self {
            buffer: SummaryTable::new(),
            platform,
        }
    }

    /// Buffers a start event for the named timer.
    pub fn record_start(&mut self, name: &str) {
        self.record_event(name, EventKind::Start);
    }

    /// Buffers an end event for the named timer.
    pub fn record_end(&mut self, name: &str) {
        self.record_event(name, EventKind::End);
    }

    /// The buffered table.
    #[must_use]
    pub fn buffer(&self) -> &SummaryTable {
        &self.buffer
    }

    /// Clears the buffer.
    pub fn reset_buffer(&mut self) {
        debug!(timers = self.buffer.len(), "event buffer reset");
        self.buffer.clear();
    }

    /// Replaces the buffer wholesale, returning the previous one.
    pub fn set_buffer(&mut self, buffer: SummaryTable) -> SummaryTable {
        debug!(timers = buffer.len(), "event buffer replaced");
        mem::replace(&mut self.buffer, buffer)
    }

    /// Takes the buffer, leaving an empty one in its place.
    #[must_use]
    pub fn take_buffer(&mut self) -> SummaryTable {
        mem::take(&mut self.buffer)
    }

    /// Appends every sequence of `table` after the same-named sequence of the buffer.
    pub fn merge(&mut self, table: SummaryTable) {
        self.buffer.merge(table);
    }

    /// Replaces the buffer with the reconstruction of the event log files at `paths`.
    ///
    /// The buffer is left untouched if any file cannot be reconstructed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::MalformedSource`] as
    /// [`parse_to_table()`][crate::parse_to_table] does.
    pub fn load_sources<I, P>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let table = parse_to_table(paths)?;
        self.set_buffer(table);
        Ok(())
    }

    /// Serializes the buffer to `writer` in the event log record format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the writer fails.
    pub fn write_buffer(&self, writer: &mut impl Write) -> Result<()> {
        self.buffer
            .write_to(writer)
            .map_err(|error| Error::io("buffer output", error))
    }

    /// Serializes the buffer to a newly created (or truncated) file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be created or written.
    pub fn write_buffer_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let label = path.display().to_string();

        let file = File::create(path).map_err(|error| Error::io(label.as_str(), error))?;
        let mut writer = BufWriter::new(file);

        self.buffer
            .write_to(&mut writer)
            .and_then(|()| writer.flush())
            .map_err(|error| Error::io(label, error))
    }

    fn record_event(&mut self, name: &str, kind: EventKind) {
        self.buffer.record(name, kind, self.platform.now_nanos());
    }
}

impl EventRecorder for BufferedLog {
    fn record(&mut self, name: &str, kind: EventKind) -> Result<()> {
        self.record_event(name, kind);
        Ok(())
    }
}
