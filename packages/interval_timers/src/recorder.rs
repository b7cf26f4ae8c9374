use crate::{EventKind, Result};

/// A destination for timer start and end events.
///
/// Implemented by [`LogWriter`][crate::LogWriter] and [`BufferedLog`][crate::BufferedLog], so
/// instrumented code can be written once and pointed at either backend.
///
/// # Examples
///
/// ```
/// use interval_timers::{BufferedLog, EventRecorder};
///
/// fn compile(recorder: &mut impl EventRecorder) -> interval_timers::Result<()> {
///     recorder.record_start("compile")?;
///     // Work happens here.
///     recorder.record_end("compile")
/// }
///
/// let mut log = BufferedLog::new();
/// compile(&mut log).unwrap();
/// assert_eq!(log.buffer().to_deltas().len(), 1);
/// ```
pub trait EventRecorder {
    /// Records one event of the named timer, timestamped now.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be recorded by this backend.
    fn record(&mut self, name: &str, kind: EventKind) -> Result<()>;

    /// Records the start of an interval of the named timer.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be recorded by this backend.
    fn record_start(&mut self, name: &str) -> Result<()> {
        self.record(name, EventKind::Start)
    }

    /// Records the end of an interval of the named timer.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be recorded by this backend.
    fn record_end(&mut self, name: &str) -> Result<()> {
        self.record(name, EventKind::End)
    }
}
