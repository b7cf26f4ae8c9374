//! Reconstruction of interval deltas from event logs.
//!
//! Reconstruction is two pure passes. The first decodes one or more log sources into a
//! [`SummaryTable`], partitioning each timer's events into start and end sequences. The second
//! pairs the i-th start with the i-th end of every timer, producing [`Deltas`]. Timers whose
//! starts and ends cannot be paired are left out of the result and reported as
//! [`Diagnostic`]s.

use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::record::RecordDecoder;
use crate::{Error, Result, SummaryTable, TimerSummary};

/// Reads and decodes the log files at `paths`, merging them into one table.
///
/// Each timer's sequences hold the events of the first file, then those of the second and so on.
///
/// # Errors
///
/// Returns [`Error::Io`] if a file cannot be read and [`Error::MalformedSource`] naming the
/// file if its contents are not a sequence of records.
pub fn parse_to_table<I, P>(paths: I) -> Result<SummaryTable>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut table = SummaryTable::new();

    for path in paths {
        let path = path.as_ref();
        let source_name = path.display().to_string();

        let bytes = fs::read(path).map_err(|error| Error::io(source_name.as_str(), error))?;
        accumulate(&mut table, &source_name, &bytes)?;
    }

    Ok(table)
}

/// Reads named sources to their end and decodes them, merging them into one table.
///
/// # Errors
///
/// Returns [`Error::Io`] if a source cannot be read and [`Error::MalformedSource`] naming the
/// source if its contents are not a sequence of records.
///
/// # Examples
///
/// ```
/// use interval_timers::{BufferedLog, parse_sources};
///
/// let mut first = BufferedLog::new();
/// first.record_start("t1");
/// let mut second = BufferedLog::new();
/// second.record_end("t1");
///
/// let mut first_bytes = Vec::new();
/// first.write_buffer(&mut first_bytes).unwrap();
/// let mut second_bytes = Vec::new();
/// second.write_buffer(&mut second_bytes).unwrap();
///
/// let table = parse_sources([("first", &first_bytes[..]), ("second", &second_bytes[..])]).unwrap();
/// assert_eq!(table.to_deltas().len(), 1);
/// ```
pub fn parse_sources<I, N, R>(sources: I) -> Result<SummaryTable>
where
    I: IntoIterator<Item = (N, R)>,
    N: AsRef<str>,
    R: Read,
{
    let mut table = SummaryTable::new();
    let mut bytes = Vec::new();

    for (source_name, mut reader) in sources {
        let source_name = source_name.as_ref();

        bytes.clear();
        reader
            .read_to_end(&mut bytes)
            .map_err(|error| Error::io(source_name, error))?;

        accumulate(&mut table, source_name, &bytes)?;
    }

    Ok(table)
}

/// Decodes a single in-memory log into a table.
///
/// # Errors
///
/// Returns [`Error::MalformedSource`] if the bytes are not a sequence of records.
pub fn parse_bytes(source_name: &str, bytes: &[u8]) -> Result<SummaryTable> {
    let mut table = SummaryTable::new();
    accumulate(&mut table, source_name, bytes)?;
    Ok(table)
}

/// Pairs every timer's starts with its ends, without ordering checks.
///
/// Equivalent to `DeltaOptions::new().compute(table)`.
#[must_use]
pub fn table_to_deltas(table: &SummaryTable) -> Deltas {
    DeltaOptions::new().compute(table)
}

fn accumulate(table: &mut SummaryTable, source_name: &str, bytes: &[u8]) -> Result<()> {
    let mut records = 0_usize;

    for record in RecordDecoder::new(source_name, bytes) {
        let record = record?;
        table.record(&record.name, record.kind, record.timestamp);
        records = records.saturating_add(1);
    }

    debug!(source_name, records, "event log source parsed");
    Ok(())
}

/// Options for pairing starts with ends.
///
/// By default pairing is permissive: the i-th start is paired with the i-th end regardless of
/// their timestamps, so an end recorded before its start yields a negative delta. Enabling
/// [`check_ordering()`][Self::check_ordering] instead excludes such timers and reports them.
///
/// # Examples
///
/// ```
/// use interval_timers::{DeltaOptions, Diagnostic, EventKind, SummaryTable};
///
/// let mut table = SummaryTable::new();
/// table.record("late", EventKind::End, 100);
/// table.record("late", EventKind::Start, 200);
///
/// assert_eq!(table.to_deltas().get("late"), Some(&[-100][..]));
///
/// let checked = DeltaOptions::new().check_ordering(true).compute(&table);
/// assert!(checked.get("late").is_none());
/// assert!(matches!(
///     checked.diagnostics(),
///     [Diagnostic::EndBeforeStart { index: 0, .. }]
/// ));
/// ```
#[derive(Clone, Debug, Default)]
pub struct DeltaOptions {
    check_ordering: bool,
}

impl DeltaOptions {
    /// Creates permissive options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether to exclude timers whose paired timestamps are out of order: an end preceding the
    /// start it is paired with, or a start preceding the end of the previous interval.
    #[must_use]
    pub fn check_ordering(self, check_ordering: bool) -> Self {
        Self { check_ordering }
    }

    /// Pairs every timer's starts with its ends.
    ///
    /// This is a pure function of the table; timers are visited in ascending name order so the
    /// diagnostics are deterministic.
    #[must_use]
    pub fn compute(&self, table: &SummaryTable) -> Deltas {
        let mut by_name = HashMap::with_capacity(table.len());
        let mut diagnostics = Vec::new();

        for name in table.names() {
            let Some(summary) = table.get(name) else {
                continue;
            };

            match self.pair(name, summary) {
                Ok(deltas) => {
                    by_name.insert(name.to_string(), deltas);
                }
                Err(diagnostic) => {
                    warn!(%diagnostic, "timer excluded from deltas");
                    diagnostics.push(diagnostic);
                }
            }
        }

        Deltas {
            by_name,
            diagnostics,
        }
    }

    fn pair(
        &self,
        name: &str,
        summary: &TimerSummary,
    ) -> std::result::Result<Vec<i64>, Diagnostic> {
        let starts = summary.starts();
        let ends = summary.ends();

        if starts.is_empty() {
            return Err(Diagnostic::NeverStarted {
                name: name.to_string(),
                ends: ends.len(),
            });
        }

        if ends.is_empty() {
            return Err(Diagnostic::NeverEnded {
                name: name.to_string(),
                starts: starts.len(),
            });
        }

        if starts.len() != ends.len() {
            return Err(Diagnostic::UnequalCounts {
                name: name.to_string(),
                starts: starts.len(),
                ends: ends.len(),
            });
        }

        if self.check_ordering {
            if let Some(index) = starts.iter().zip(ends).position(|(start, end)| start > end) {
                return Err(Diagnostic::EndBeforeStart {
                    name: name.to_string(),
                    index,
                });
            }

            if let Some(((index, _), _)) = starts
                .iter()
                .enumerate()
                .skip(1)
                .zip(ends)
                .find(|&((_, start), previous_end)| start < previous_end)
            {
                return Err(Diagnostic::RestartedBeforeEnd {
                    name: name.to_string(),
                    index,
                });
            }
        }

        Ok(starts
            .iter()
            .zip(ends)
            .map(|(start, end)| end.wrapping_sub(*start))
            .collect())
    }
}

/// Why a timer was left out of [`Deltas`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Diagnostic {
    /// The timer has ends but no starts.
    NeverStarted {
        /// Name of the timer.
        name: String,

        /// Number of recorded ends.
        ends: usize,
    },

    /// The timer has starts but no ends.
    NeverEnded {
        /// Name of the timer.
        name: String,

        /// Number of recorded starts.
        starts: usize,
    },

    /// The timer has both starts and ends, but not the same number of each.
    UnequalCounts {
        /// Name of the timer.
        name: String,

        /// Number of recorded starts.
        starts: usize,

        /// Number of recorded ends.
        ends: usize,
    },

    /// The end at `index` precedes the start it is paired with. Only reported when ordering
    /// checks are enabled.
    EndBeforeStart {
        /// Name of the timer.
        name: String,

        /// Position of the offending pair.
        index: usize,
    },

    /// The start at `index` precedes the end of the previous pair. Only reported when ordering
    /// checks are enabled.
    RestartedBeforeEnd {
        /// Name of the timer.
        name: String,

        /// Position of the offending start.
        index: usize,
    },
}

impl Diagnostic {
    /// Name of the affected timer.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::NeverStarted { name, .. }
            | Self::NeverEnded { name, .. }
            | Self::UnequalCounts { name, .. }
            | Self::EndBeforeStart { name, .. }
            | Self::RestartedBeforeEnd { name, .. } => name,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NeverStarted { name, ends } => {
                write!(f, "timer {name} was ended {ends} times but never started")
            }
            Self::NeverEnded { name, starts } => {
                write!(f, "timer {name} was started {starts} times but never ended")
            }
            Self::UnequalCounts { name, starts, ends } => write!(
                f,
                "timer {name} has a different number of starts ({starts}) than ends ({ends})"
            ),
            Self::EndBeforeStart { name, index } => {
                write!(f, "timer {name} has an end time preceding start time at #{index}")
            }
            Self::RestartedBeforeEnd { name, index } => write!(
                f,
                "timer {name} was started again at #{index} before the previous interval ended"
            ),
        }
    }
}

/// Completed-interval durations per timer name, in nanoseconds, plus the diagnostics for
/// timers that could not be paired.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Deltas {
    by_name: HashMap<String, Vec<i64>>,
    diagnostics: Vec<Diagnostic>,
}

impl Deltas {
    /// The deltas of the named timer in pairing order, if it passed all checks.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[i64]> {
        self.by_name.get(name).map(Vec::as_slice)
    }

    /// Iterates over the paired timers in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, Vec<i64>> {
        self.by_name.iter()
    }

    /// Number of timers that produced deltas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no timer produced deltas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Timers left out of the result, in ascending name order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consumes the result, returning the name-to-deltas map.
    #[must_use]
    pub fn into_map(self) -> HashMap<String, Vec<i64>> {
        self.by_name
    }
}

impl<'a> IntoIterator for &'a Deltas {
    type Item = (&'a String, &'a Vec<i64>);
    type IntoIter = hash_map::Iter<'a, String, Vec<i64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io;

    use super::*;
    use crate::EventKind;
    use crate::record::encode_record;

    fn log(events: &[(&str, EventKind, i64)]) -> Vec<u8> {
        events
            .iter()
            .flat_map(|&(name, kind, timestamp)| encode_record(name, kind, timestamp))
            .collect()
    }

    #[test]
    fn interleaved_timers_across_two_sources() {
        let first = log(&[
            ("t1", EventKind::Start, 100),
            ("t2", EventKind::Start, 150),
        ]);
        let second = log(&[("t1", EventKind::End, 300), ("t2", EventKind::End, 400)]);

        let table = parse_sources([("first", first.as_slice()), ("second", second.as_slice())])
            .unwrap();
        let deltas = table_to_deltas(&table);

        assert_eq!(deltas.get("t1"), Some(&[200][..]));
        assert_eq!(deltas.get("t2"), Some(&[250][..]));
        assert_eq!(deltas.len(), 2);
        assert!(deltas.diagnostics().is_empty());
    }

    #[test]
    fn merging_sources_equals_name_wise_concatenation() {
        let a = log(&[
            ("x", EventKind::Start, 1),
            ("y", EventKind::End, 2),
            ("x", EventKind::End, 3),
        ]);
        let b = log(&[("x", EventKind::Start, 4), ("z", EventKind::Start, 5)]);

        let merged = parse_sources([("a", a.as_slice()), ("b", b.as_slice())]).unwrap();

        let mut concatenated = parse_bytes("a", &a).unwrap();
        concatenated.merge(parse_bytes("b", &b).unwrap());

        assert_eq!(merged, concatenated);
        assert_eq!(
            merged.get("x"),
            Some(&TimerSummary::new(vec![1, 4], vec![3]))
        );
    }

    #[test]
    fn split_interval_sums_to_whole() {
        // One interval measured whole, and the same span split into two back-to-back intervals
        // recorded in separate sources.
        let whole = log(&[("w", EventKind::Start, 1_000), ("w", EventKind::End, 1_900)]);
        let part1 = log(&[("p", EventKind::Start, 1_000), ("p", EventKind::End, 1_350)]);
        let part2 = log(&[("p", EventKind::Start, 1_350), ("p", EventKind::End, 1_900)]);

        let table = parse_sources([
            ("whole", whole.as_slice()),
            ("part1", part1.as_slice()),
            ("part2", part2.as_slice()),
        ])
        .unwrap();
        let deltas = table.to_deltas();

        let parts: i64 = deltas.get("p").unwrap().iter().sum();
        assert_eq!(deltas.get("w"), Some(&[parts][..]));
    }

    #[test]
    fn pairing_is_positional_not_by_value() {
        let mut table = SummaryTable::new();
        table.insert("t", TimerSummary::new(vec![10, 20], vec![50, 15]));

        let deltas = table.to_deltas();
        assert_eq!(deltas.get("t"), Some(&[40, -5][..]));
    }

    #[test]
    fn two_starts_one_end_is_excluded_as_unequal() {
        let mut table = SummaryTable::new();
        table.insert("t", TimerSummary::new(vec![1, 2], vec![3]));

        let deltas = table.to_deltas();
        assert!(deltas.is_empty());
        assert_eq!(
            deltas.diagnostics(),
            [Diagnostic::UnequalCounts {
                name: "t".to_string(),
                starts: 2,
                ends: 1,
            }]
        );
    }

    #[test]
    fn never_started_and_never_ended_are_reported() {
        let mut table = SummaryTable::new();
        table.record("ended_only", EventKind::End, 5);
        table.record("started_only", EventKind::Start, 5);
        table.record("fine", EventKind::Start, 5);
        table.record("fine", EventKind::End, 8);

        let deltas = table.to_deltas();

        assert_eq!(deltas.get("fine"), Some(&[3][..]));
        assert_eq!(
            deltas.diagnostics(),
            [
                Diagnostic::NeverStarted {
                    name: "ended_only".to_string(),
                    ends: 1,
                },
                Diagnostic::NeverEnded {
                    name: "started_only".to_string(),
                    starts: 1,
                },
            ]
        );
    }

    #[test]
    fn deltas_are_idempotent() {
        let mut table = SummaryTable::new();
        table.insert("a", TimerSummary::new(vec![1, 5], vec![3, 9]));
        table.insert("b", TimerSummary::new(vec![1], vec![]));

        assert_eq!(table_to_deltas(&table), table_to_deltas(&table));
    }

    #[test]
    fn ordering_checks_are_opt_in() {
        let mut table = SummaryTable::new();
        // Second interval starts before the first one ends.
        table.insert("overlap", TimerSummary::new(vec![10, 15], vec![20, 30]));

        assert_eq!(table.to_deltas().get("overlap"), Some(&[10, 15][..]));

        let checked = table.to_deltas_with(&DeltaOptions::new().check_ordering(true));
        assert!(checked.is_empty());
        assert_eq!(
            checked.diagnostics(),
            [Diagnostic::RestartedBeforeEnd {
                name: "overlap".to_string(),
                index: 1,
            }]
        );
    }

    #[test]
    fn ordered_intervals_pass_ordering_checks() {
        let mut table = SummaryTable::new();
        table.insert("ok", TimerSummary::new(vec![10, 20, 20], vec![20, 20, 25]));

        let checked = DeltaOptions::new().check_ordering(true).compute(&table);
        assert_eq!(checked.get("ok"), Some(&[10, 0, 5][..]));
    }

    #[test]
    fn malformed_source_is_named() {
        let good = log(&[("t", EventKind::Start, 1)]);
        let bad = vec![0, b't', 0];

        let error = parse_sources([("good", good.as_slice()), ("bad", bad.as_slice())])
            .unwrap_err();
        assert!(matches!(
            error,
            Error::MalformedSource { ref source_name, .. } if source_name == "bad"
        ));
    }

    #[test]
    fn unreadable_source_is_io_error() {
        struct FailingReader;

        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("device gone"))
            }
        }

        let error = parse_sources([("broken", FailingReader)]).unwrap_err();
        assert!(matches!(error, Error::Io { ref target, .. } if target == "broken"));
    }

    #[test]
    fn parse_to_table_reads_files() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("log");
        fs::write(&path, log(&[("f", EventKind::Start, 2), ("f", EventKind::End, 7)])).unwrap();

        let table = parse_to_table([&path]).unwrap();
        assert_eq!(table.to_deltas().get("f"), Some(&[5][..]));

        let missing = temp.path().join("missing");
        assert!(matches!(
            parse_to_table([&missing]),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn diagnostic_display() {
        let diagnostic = Diagnostic::NeverEnded {
            name: "slowfib".to_string(),
            starts: 2,
        };
        assert_eq!(
            diagnostic.to_string(),
            "timer slowfib was started 2 times but never ended"
        );
        assert_eq!(diagnostic.name(), "slowfib");
    }
}
