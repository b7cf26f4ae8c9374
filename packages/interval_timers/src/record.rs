//! Binary event log record format.
//!
//! A log is a sequence of records, each laid out as
//!
//! ```text
//! SEP name SEP kind SEP timestamp
//! ```
//!
//! where `SEP` is [`SEPARATOR`], `name` is the timer name, `kind` is `s` for a start or `e` for
//! an end and `timestamp` is a signed 64-bit little-endian nanosecond count. A non-empty log
//! therefore always begins with `SEP`. The timestamp is a fixed 8 bytes and may itself contain
//! `SEP`, so it is length-delimited rather than separator-delimited.

use std::borrow::Cow;
use std::io::{self, Write};

use crate::{Error, Result};

/// The byte that delimits record fields. Timer names must not contain it.
pub const SEPARATOR: u8 = 0;

const TIMESTAMP_LEN: usize = size_of::<i64>();

// Three separators, one kind byte and the timestamp.
const RECORD_OVERHEAD: usize = 4 + TIMESTAMP_LEN;

/// Whether an event marks the start or the end of an interval.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum EventKind {
    /// The interval begins.
    Start,

    /// The interval ends.
    End,
}

impl EventKind {
    /// The kind token written to the log.
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            Self::Start => b's',
            Self::End => b'e',
        }
    }

    // Anything other than the start token counts as an end.
    fn from_token(token: &[u8]) -> Self {
        if token == [Self::Start.tag()] {
            Self::Start
        } else {
            Self::End
        }
    }
}

/// One immutable start or end event of a named timer.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Event {
    name: String,
    kind: EventKind,
    timestamp: i64,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EventKind, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            kind,
            timestamp,
        }
    }

    /// Name of the timer the event belongs to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the event starts or ends an interval.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Nanosecond timestamp of the event.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Appends the encoded record to `writer`.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the writer.
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        write_record(writer, &self.name, self.kind, self.timestamp)
    }
}

/// Decodes every record of an in-memory log.
///
/// `source_name` identifies the log in error messages.
///
/// # Errors
///
/// Returns [`Error::MalformedSource`] if the bytes are not a sequence of well-formed records.
///
/// # Examples
///
/// ```
/// use interval_timers::{Event, EventKind, decode_events};
///
/// let mut log = Vec::new();
/// Event::new("fetch", EventKind::Start, 100)
///     .write_to(&mut log)
///     .unwrap();
///
/// let events = decode_events("memory", &log).unwrap();
/// assert_eq!(events, vec![Event::new("fetch", EventKind::Start, 100)]);
/// ```
pub fn decode_events(source_name: &str, bytes: &[u8]) -> Result<Vec<Event>> {
    RecordDecoder::new(source_name, bytes)
        .map(|record| record.map(|record| Event::new(record.name, record.kind, record.timestamp)))
        .collect()
}

/// Writes one record as a single `write_all` call.
pub(crate) fn write_record(
    writer: &mut impl Write,
    name: &str,
    kind: EventKind,
    timestamp: i64,
) -> io::Result<()> {
    writer.write_all(&encode_record(name, kind, timestamp))
}

pub(crate) fn encode_record(name: &str, kind: EventKind, timestamp: i64) -> Vec<u8> {
    let mut record = Vec::with_capacity(name.len().saturating_add(RECORD_OVERHEAD));

    record.push(SEPARATOR);
    record.extend_from_slice(name.as_bytes());
    record.push(SEPARATOR);
    record.push(kind.tag());
    record.push(SEPARATOR);
    record.extend_from_slice(&timestamp.to_le_bytes());

    record
}

/// A decoded record borrowing its name from the source bytes where possible.
#[derive(Debug)]
pub(crate) struct Record<'a> {
    pub(crate) name: Cow<'a, str>,
    pub(crate) kind: EventKind,
    pub(crate) timestamp: i64,
}

/// Iterates over the records of one source, stopping at the first malformed record.
#[derive(Debug)]
pub(crate) struct RecordDecoder<'a> {
    source_name: &'a str,
    remaining: &'a [u8],

    // Offset of `remaining` within the source.
    offset: usize,

    failed: bool,
}

impl<'a> RecordDecoder<'a> {
    pub(crate) fn new(source_name: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            source_name,
            remaining: bytes,
            offset: 0,
            failed: false,
        }
    }

    fn decode_next(&mut self) -> Result<Option<Record<'a>>> {
        let Some((&first, fields)) = self.remaining.split_first() else {
            return Ok(None);
        };

        if first != SEPARATOR {
            return Err(self.malformed("expected a record separator"));
        }

        let (name, after_name) = split_field(fields)
            .ok_or_else(|| self.malformed("timer name is not followed by a separator"))?;

        let (kind, after_kind) = split_field(after_name)
            .ok_or_else(|| self.malformed("event kind is not followed by a separator"))?;

        let Some((timestamp, rest)) = after_kind.split_first_chunk::<TIMESTAMP_LEN>() else {
            return Err(self.malformed(format!(
                "timestamp has {} bytes instead of {TIMESTAMP_LEN}",
                after_kind.len()
            )));
        };

        let consumed = self.remaining.len().saturating_sub(rest.len());
        self.offset = self.offset.saturating_add(consumed);
        self.remaining = rest;

        Ok(Some(Record {
            name: String::from_utf8_lossy(name),
            kind: EventKind::from_token(kind),
            timestamp: i64::from_le_bytes(*timestamp),
        }))
    }

    fn malformed(&self, problem: impl Into<String>) -> Error {
        Error::malformed(self.source_name, self.offset, problem)
    }
}

impl<'a> Iterator for RecordDecoder<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let next = self.decode_next();
        self.failed = next.is_err();
        next.transpose()
    }
}

/// Splits off the bytes up to the next separator, consuming the separator.
fn split_field(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let end = bytes.iter().position(|&b| b == SEPARATOR)?;
    let (field, rest) = bytes.split_at(end);

    // `rest` starts with the separator.
    Some((field, rest.get(1..)?))
}
