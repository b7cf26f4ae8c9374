//! Unbuffered event log writer.

use std::any::type_name;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::pal::{Platform, PlatformFacade};
use crate::record::write_record;
use crate::{Error, EventKind, EventRecorder, Result};

/// Appends timer events to a single active sink in the event log record format.
///
/// A writer has at most one active sink. Setting a new sink closes the previous one, and
/// [`close_sink()`][Self::close_sink] flushes and releases it. Recording without an active
/// sink is a usage fault.
///
/// Writes to file sinks are buffered. Write failures surface either from the recording call
/// or, at the latest, from [`flush()`][Self::flush] or [`close_sink()`][Self::close_sink].
///
/// # Examples
///
/// ```
/// use interval_timers::{LogWriter, parse_to_table};
///
/// let temp = tempfile::tempdir().unwrap();
/// let path = temp.path().join("timers.log");
///
/// let mut writer = LogWriter::to_file(&path).unwrap();
/// writer.record_start("fastfib").unwrap();
/// writer.record_end("fastfib").unwrap();
/// writer.close_sink().unwrap();
///
/// let deltas = parse_to_table([&path]).unwrap().to_deltas();
/// assert_eq!(deltas.get("fastfib").map(<[i64]>::len), Some(1));
/// ```
#[derive(Debug)]
pub struct LogWriter {
    sink: Option<ActiveSink>,
    platform: PlatformFacade,
}

impl LogWriter {
    /// Creates a writer with no active sink.
    #[expect(
        clippy::new_without_default,
        reason = "a writer without a sink is not a meaningful default"
    )]
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform(PlatformFacade::real())
    }

    /// Creates a writer whose active sink is a newly created (or truncated) file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be created.
    pub fn to_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut writer = Self::new();
        writer.set_sink(path)?;
        Ok(writer)
    }

    pub(crate) fn with_platform(platform: PlatformFacade) -> Self {
        Self {
            sink: None,
            platform,
        }
    }

    /// Creates (or truncates) the file at `path` and makes it the active sink.
    ///
    /// The previous sink is flushed before the file is created, so re-setting the path of the
    /// active sink starts a fresh log instead of mixing the old buffered records into it. If
    /// the flush or the creation fails, the previous sink stays active. Otherwise the previous
    /// sink is closed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the previous sink fails to flush or the file cannot be created.
    pub fn set_sink(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let label = path.display().to_string();

        if let Some(previous) = self.sink.as_mut() {
            previous.flush()?;
        }

        let file = File::create(path).map_err(|error| Error::io(label.as_str(), error))?;
        self.replace_sink(ActiveSink::new(label, BufWriter::new(file)))
    }

    /// Makes an arbitrary writer the active sink, closing the previous one.
    ///
    /// `label` identifies the sink in errors and log messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the previous sink fails to flush. The new sink is active
    /// regardless.
    pub fn set_sink_writer(
        &mut self,
        label: impl Into<String>,
        writer: impl Write + Send + 'static,
    ) -> Result<()> {
        self.replace_sink(ActiveSink::new(label.into(), writer))
    }

    /// Flushes and releases the active sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveSink`] if no sink is active, or [`Error::Io`] if the final
    /// flush fails. The sink is released either way.
    pub fn close_sink(&mut self) -> Result<()> {
        let sink = self.sink.take().ok_or(Error::NoActiveSink)?;
        sink.close()
    }

    /// Flushes buffered events to the active sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveSink`] if no sink is active, or [`Error::Io`] if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.as_mut().ok_or(Error::NoActiveSink)?.flush()
    }

    /// Whether a sink is active.
    #[must_use]
    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Label of the active sink, if any.
    #[must_use]
    pub fn sink_label(&self) -> Option<&str> {
        self.sink.as_ref().map(|sink| sink.label.as_str())
    }

    /// Appends a start event for the named timer.
    ///
    /// The name must not contain [`SEPARATOR`][crate::SEPARATOR].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveSink`] if no sink is active, or [`Error::Io`] if the write fails.
    pub fn record_start(&mut self, name: &str) -> Result<()> {
        self.record_event(name, EventKind::Start)
    }

    /// Appends an end event for the named timer.
    ///
    /// The name must not contain [`SEPARATOR`][crate::SEPARATOR].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveSink`] if no sink is active, or [`Error::Io`] if the write fails.
    pub fn record_end(&mut self, name: &str) -> Result<()> {
        self.record_event(name, EventKind::End)
    }

    fn record_event(&mut self, name: &str, kind: EventKind) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(Error::NoActiveSink)?;
        let timestamp = self.platform.now_nanos();

        trace!(name, ?kind, timestamp, sink = %sink.label, "recording event");

        write_record(&mut sink.writer, name, kind, timestamp)
            .map_err(|error| Error::io(sink.label.as_str(), error))
    }

    fn replace_sink(&mut self, sink: ActiveSink) -> Result<()> {
        debug!(sink = %sink.label, "event log sink activated");

        match self.sink.replace(sink) {
            Some(previous) => previous.close(),
            None => Ok(()),
        }
    }
}

impl EventRecorder for LogWriter {
    fn record(&mut self, name: &str, kind: EventKind) -> Result<()> {
        self.record_event(name, kind)
    }
}

impl Drop for LogWriter {
    #[cfg_attr(test, mutants::skip)] // Best-effort cleanup; the explicit close path is tested.
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            let label = sink.label.clone();

            if let Err(error) = sink.close() {
                warn!(sink = %label, %error, "event log sink failed to flush on drop");
            }
        }
    }
}

struct ActiveSink {
    label: String,
    writer: Box<dyn Write + Send>,
}

impl ActiveSink {
    fn new(label: String, writer: impl Write + Send + 'static) -> Self {
        Self {
            label,
            writer: Box::new(writer),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|error| Error::io(self.label.as_str(), error))
    }

    fn close(mut self) -> Result<()> {
        let result = self.flush();
        debug!(sink = %self.label, "event log sink closed");
        result
    }
}

impl fmt::Debug for ActiveSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::pal::FakePlatform;
    use crate::record::encode_record;
    use crate::{SummaryTable, TimerSummary, parse_bytes};

    assert_impl_all!(LogWriter: Send);

    /// In-memory sink whose contents remain readable after the writer takes ownership of a clone.
    #[derive(Clone, Debug, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    fn create_test_writer() -> (LogWriter, FakePlatform) {
        let clock = FakePlatform::starting_at(100);
        let writer = LogWriter::with_platform(PlatformFacade::fake(clock.clone()));
        (writer, clock)
    }

    #[test]
    fn records_use_wire_format_and_clock() {
        let (mut writer, clock) = create_test_writer();
        let buffer = SharedBuffer::default();
        writer.set_sink_writer("memory", buffer.clone()).unwrap();

        writer.record_start("t1").unwrap();
        clock.set_now(300);
        writer.record_end("t1").unwrap();

        let mut expected = encode_record("t1", EventKind::Start, 100);
        expected.extend(encode_record("t1", EventKind::End, 300));
        assert_eq!(buffer.contents(), expected);
    }

    #[test]
    fn recording_without_sink_is_usage_fault() {
        let (mut writer, _clock) = create_test_writer();

        assert!(matches!(writer.record_start("t"), Err(Error::NoActiveSink)));
        assert!(matches!(writer.flush(), Err(Error::NoActiveSink)));
    }

    #[test]
    fn closing_twice_is_usage_fault() {
        let (mut writer, _clock) = create_test_writer();
        writer.set_sink_writer("memory", SharedBuffer::default()).unwrap();

        writer.close_sink().unwrap();
        assert!(!writer.has_sink());
        assert!(matches!(writer.close_sink(), Err(Error::NoActiveSink)));
    }

    #[test]
    fn setting_sink_replaces_previous() {
        let (mut writer, _clock) = create_test_writer();
        let first = SharedBuffer::default();
        let second = SharedBuffer::default();

        writer.set_sink_writer("first", first.clone()).unwrap();
        writer.record_start("a").unwrap();
        writer.set_sink_writer("second", second.clone()).unwrap();
        writer.record_end("a").unwrap();

        assert_eq!(writer.sink_label(), Some("second"));

        let first_table = parse_bytes("first", &first.contents()).unwrap();
        let second_table = parse_bytes("second", &second.contents()).unwrap();
        assert_eq!(first_table.get("a"), Some(&TimerSummary::new(vec![100], vec![])));
        assert_eq!(second_table.get("a"), Some(&TimerSummary::new(vec![], vec![100])));
    }

    #[test]
    fn write_failure_is_io_error_naming_sink() {
        let (mut writer, _clock) = create_test_writer();
        writer.set_sink_writer("broken", FailingSink).unwrap();

        let error = writer.record_start("t").unwrap_err();
        assert!(matches!(error, Error::Io { ref target, .. } if target == "broken"));

        // The sink is released even though its final flush fails.
        writer.close_sink().unwrap_err();
        assert!(!writer.has_sink());
    }

    #[test]
    fn file_sink_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("logtimer");
        let (mut writer, clock) = create_test_writer();

        writer.set_sink(&path).unwrap();
        writer.record_start("fastfib").unwrap();
        clock.advance(10);
        writer.record_end("fastfib").unwrap();
        writer.record_start("slowfib").unwrap();
        clock.advance(1_000);
        writer.record_end("slowfib").unwrap();
        writer.close_sink().unwrap();

        let deltas = crate::parse_to_table([&path]).unwrap().to_deltas();
        assert_eq!(deltas.get("fastfib"), Some(&[10][..]));
        assert_eq!(deltas.get("slowfib"), Some(&[1_000][..]));
    }

    #[test]
    fn resetting_same_path_starts_fresh_log() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("logtimer");
        let (mut writer, clock) = create_test_writer();

        writer.set_sink(&path).unwrap();
        writer.record_start("a_rather_long_timer_name").unwrap();

        writer.set_sink(&path).unwrap();
        writer.record_start("x").unwrap();
        clock.advance(7);
        writer.record_end("x").unwrap();
        writer.close_sink().unwrap();

        let table = crate::parse_to_table([&path]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.to_deltas().get("x"), Some(&[7][..]));
    }

    #[test]
    fn failing_to_flush_previous_sink_keeps_it_active() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("never_created");
        let (mut writer, _clock) = create_test_writer();
        writer.set_sink_writer("broken", FailingSink).unwrap();

        assert!(matches!(
            writer.set_sink(&path),
            Err(Error::Io { ref target, .. }) if target == "broken"
        ));
        assert_eq!(writer.sink_label(), Some("broken"));
        assert!(!path.exists());
    }

    #[test]
    fn failing_to_create_file_keeps_previous_sink() {
        let temp = tempfile::tempdir().unwrap();
        let (mut writer, _clock) = create_test_writer();
        let buffer = SharedBuffer::default();
        writer.set_sink_writer("memory", buffer.clone()).unwrap();

        let unreachable = temp.path().join("missing_dir").join("log");
        assert!(matches!(writer.set_sink(&unreachable), Err(Error::Io { .. })));

        writer.record_start("still_here").unwrap();
        assert_eq!(writer.sink_label(), Some("memory"));
        assert!(!buffer.contents().is_empty());
    }

    #[test]
    fn usable_through_recorder_trait() {
        fn bracket(recorder: &mut impl EventRecorder) -> Result<()> {
            recorder.record_start("region")?;
            recorder.record_end("region")
        }

        let (mut writer, _clock) = create_test_writer();
        let buffer = SharedBuffer::default();
        writer.set_sink_writer("memory", buffer.clone()).unwrap();

        bracket(&mut writer).unwrap();

        let mut expected = SummaryTable::new();
        expected.insert("region", TimerSummary::new(vec![100], vec![100]));
        assert_eq!(parse_bytes("memory", &buffer.contents()).unwrap(), expected);
    }
}
