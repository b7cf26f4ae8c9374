//! Per-name partitions of an event stream into start and end timestamps.

use std::collections::HashMap;
use std::collections::hash_map;
use std::io::{self, Write};

use itertools::{EitherOrBoth, Itertools};

use crate::record::write_record;
use crate::{DeltaOptions, Deltas, EventKind};

/// The start and end timestamps recorded for one timer name, each in encounter order.
///
/// This is the raw material for computing deltas: it is not yet paired into intervals.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TimerSummary {
    starts: Vec<i64>,
    ends: Vec<i64>,
}

impl TimerSummary {
    /// Creates a summary from explicit start and end sequences.
    #[must_use]
    pub fn new(starts: Vec<i64>, ends: Vec<i64>) -> Self {
        Self { starts, ends }
    }

    /// Start timestamps in encounter order.
    #[must_use]
    pub fn starts(&self) -> &[i64] {
        &self.starts
    }

    /// End timestamps in encounter order.
    #[must_use]
    pub fn ends(&self) -> &[i64] {
        &self.ends
    }

    pub(crate) fn push(&mut self, kind: EventKind, timestamp: i64) {
        match kind {
            EventKind::Start => self.starts.push(timestamp),
            EventKind::End => self.ends.push(timestamp),
        }
    }

    fn append(&mut self, other: Self) {
        self.starts.extend(other.starts);
        self.ends.extend(other.ends);
    }
}

/// Name-indexed table of [`TimerSummary`] values, as produced by reconstructing an event log
/// or accumulated by a [`BufferedLog`][crate::BufferedLog].
///
/// # Examples
///
/// ```
/// use interval_timers::{EventKind, SummaryTable};
///
/// let mut table = SummaryTable::new();
/// table.record("t1", EventKind::Start, 100);
/// table.record("t1", EventKind::End, 300);
///
/// let deltas = table.to_deltas();
/// assert_eq!(deltas.get("t1"), Some(&[200][..]));
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SummaryTable {
    timers: HashMap<String, TimerSummary>,
}

impl SummaryTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one event timestamp to the named timer's summary.
    pub fn record(&mut self, name: &str, kind: EventKind, timestamp: i64) {
        // Avoid allocating the key for names that are already present.
        if let Some(summary) = self.timers.get_mut(name) {
            summary.push(kind, timestamp);
        } else {
            self.timers
                .entry(name.to_string())
                .or_default()
                .push(kind, timestamp);
        }
    }

    /// Inserts or replaces the summary of the named timer.
    pub fn insert(&mut self, name: impl Into<String>, summary: TimerSummary) {
        self.timers.insert(name.into(), summary);
    }

    /// The summary of the named timer, if any event was recorded for it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TimerSummary> {
        self.timers.get(name)
    }

    /// Iterates over all timers in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, TimerSummary> {
        self.timers.iter()
    }

    /// Timer names in ascending order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.timers.keys().map(String::as_str).sorted_unstable().collect()
    }

    /// Number of timers in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether the table holds no timers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Removes all timers.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Appends every sequence of `other` after the same-named sequence of this table.
    pub fn merge(&mut self, other: Self) {
        for (name, summary) in other.timers {
            match self.timers.entry(name) {
                hash_map::Entry::Occupied(mut existing) => existing.get_mut().append(summary),
                hash_map::Entry::Vacant(vacant) => {
                    vacant.insert(summary);
                }
            }
        }
    }

    /// Serializes the table in the event log record format.
    ///
    /// Timers are written in ascending name order. For each timer, start and end events are
    /// interleaved index by index, so reconstructing the output yields the same start and end
    /// sequences.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the writer.
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        for name in self.names() {
            let Some(summary) = self.timers.get(name) else {
                continue;
            };

            for pair in summary.starts.iter().zip_longest(&summary.ends) {
                let (start, end) = match pair {
                    EitherOrBoth::Both(start, end) => (Some(start), Some(end)),
                    EitherOrBoth::Left(start) => (Some(start), None),
                    EitherOrBoth::Right(end) => (None, Some(end)),
                };

                if let Some(&start) = start {
                    write_record(writer, name, EventKind::Start, start)?;
                }

                if let Some(&end) = end {
                    write_record(writer, name, EventKind::End, end)?;
                }
            }
        }

        Ok(())
    }

    /// Pairs starts with ends into deltas without ordering checks.
    ///
    /// Equivalent to [`table_to_deltas()`][crate::table_to_deltas].
    #[must_use]
    pub fn to_deltas(&self) -> Deltas {
        self.to_deltas_with(&DeltaOptions::default())
    }

    /// Pairs starts with ends into deltas using the given options.
    #[must_use]
    pub fn to_deltas_with(&self, options: &DeltaOptions) -> Deltas {
        options.compute(self)
    }
}

impl<'a> IntoIterator for &'a SummaryTable {
    type Item = (&'a String, &'a TimerSummary);
    type IntoIter = hash_map::Iter<'a, String, TimerSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(String, TimerSummary)> for SummaryTable {
    fn from_iter<T: IntoIterator<Item = (String, TimerSummary)>>(iter: T) -> Self {
        Self {
            timers: iter.into_iter().collect(),
        }
    }
}
