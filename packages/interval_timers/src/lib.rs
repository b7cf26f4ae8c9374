#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Named wall-clock interval timers for bracketing regions of work.
//!
//! A timer is a named interval from a start event to an end event, measured in nanoseconds of
//! wall-clock time. Three interchangeable backends are provided:
//!
//! * [`KeyedTimers`] - an in-memory table, for timing within one process.
//! * [`FileTimerStore`] - one small file per timestamp under a [`TimerDirectory`], for timers
//!   shared between processes or kept across restarts.
//! * An append-only binary event log, for high-volume capture that is reconstructed into
//!   interval summaries afterwards. Events are written by a [`LogWriter`] (to a file or any
//!   other sink) or accumulated in memory by a [`BufferedLog`], and turned back into durations
//!   by [`parse_to_table()`] and [`table_to_deltas()`].
//!
//! This is not a metrics or tracing pipeline. None of the types synchronize internally;
//! coordinate access to a shared timer or sink externally.
//!
//! # Keyed timers
//!
//! ```
//! use interval_timers::KeyedTimers;
//!
//! let mut timers = KeyedTimers::new();
//!
//! timers.start("total").unwrap();
//! let so_far = timers.poll("total").unwrap();
//! timers.end("total").unwrap();
//!
//! println!("so far: {so_far} ns, total: {}", timers.delta("total"));
//! ```
//!
//! # Event log
//!
//! Events from any number of log files are merged per timer name and paired positionally: the
//! i-th start of a timer with its i-th end.
//!
//! ```
//! use interval_timers::{LogWriter, parse_to_table, table_to_deltas};
//!
//! let temp = tempfile::tempdir().unwrap();
//! let first = temp.path().join("phase1.log");
//! let second = temp.path().join("phase2.log");
//!
//! let mut writer = LogWriter::to_file(&first).unwrap();
//! writer.record_start("load").unwrap();
//!
//! // Replacing the sink closes the previous one.
//! writer.set_sink(&second).unwrap();
//! writer.record_end("load").unwrap();
//! writer.close_sink().unwrap();
//!
//! let table = parse_to_table([&first, &second]).unwrap();
//! let deltas = table_to_deltas(&table);
//!
//! for (name, durations) in &deltas {
//!     println!("{name}: {durations:?}");
//! }
//! assert!(deltas.diagnostics().is_empty());
//! ```
//!
//! Timers whose starts and ends cannot be paired are left out of the deltas and reported as
//! [`Diagnostic`]s, which are also logged through `tracing`.
//!
//! # Errors
//!
//! Lifecycle misuse (starting a running timer, closing a sink that is not open and so on), I/O
//! failures and malformed logs are all reported as [`Error`]. Use
//! [`Error::is_usage_fault()`] to tell programming mistakes apart from environmental failures.
//! Querying an incomplete timer is not an error: `delta()` returns a [`TimerDelta`].

mod buffered;
mod delta;
mod directory;
mod error;
mod file_store;
mod keyed;
mod log_writer;
mod pal;
mod reconstruct;
mod record;
mod recorder;
mod summary;

pub use buffered::*;
pub use delta::*;
pub use directory::*;
pub use error::*;
pub use file_store::*;
pub use keyed::*;
pub use log_writer::*;
pub use reconstruct::*;
pub use record::{Event, EventKind, SEPARATOR, decode_events};
pub use recorder::*;
pub use summary::*;
