// LogPane - core/parser.rs
//
// Stream-oriented entry assembly and row mapping.
// Core layer: accepts BufRead trait objects, never touches the filesystem.
//
// Assembly groups physical lines into logical entries. A line opens a new
// entry when the field at the marker index parses as a timestamp; every
// other line continues the entry being built. Lines before the first
// timestamp are header noise and are dropped.
//
// Neither assembly nor mapping ever fails: malformed input degrades to empty
// fields and the unknown timestamp, and I/O faults or cancellation end the
// read with whatever entries were already finalised.

use crate::core::cancel::CancelToken;
use crate::core::model::{unknown_timestamp, Entry, ReadOptions, Row};
use crate::util::constants;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::io::{self, BufRead};
use std::time::Instant;

/// Why assembly stopped.
#[derive(Debug)]
pub enum AssemblyStop {
    /// The whole stream was consumed.
    EndOfStream,

    /// The cancel token fired at a line boundary.
    Cancelled,

    /// The underlying reader failed; entries hold what was finalised before.
    Faulted(io::Error),
}

/// Result of assembling one stream.
#[derive(Debug)]
pub struct AssemblyReport {
    /// Fully finalised entries in file order.
    pub entries: Vec<Entry>,

    pub stop: AssemblyStop,

    /// Physical lines consumed, header noise included.
    pub lines_read: u64,
}

/// Assemble the stream into entries.
///
/// `on_progress` receives the count of finalised entries at most once per
/// `options.progress_interval`; it runs on the reading thread and should be
/// cheap (e.g. a channel send).
///
/// On cancellation or a read fault the entry still being buffered is
/// dropped, so the report only holds complete entries.
pub fn assemble<R, F>(
    mut reader: R,
    options: &ReadOptions,
    cancel: &CancelToken,
    mut on_progress: F,
) -> AssemblyReport
where
    R: BufRead,
    F: FnMut(usize),
{
    let delimiter = options.delimiter.as_str();
    let marker = options.marker_index;

    let mut entries: Vec<Entry> = Vec::new();
    let mut buffer: Vec<String> = Vec::new();
    let mut scratch: Vec<u8> = Vec::new();
    let mut lines_read: u64 = 0;
    let mut last_report = Instant::now();

    let stop = loop {
        if cancel.is_cancelled() {
            break AssemblyStop::Cancelled;
        }

        let line = match read_line_lossy(&mut reader, &mut scratch) {
            Ok(Some(line)) => line,
            Ok(None) => break AssemblyStop::EndOfStream,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => break AssemblyStop::Faulted(e),
        };
        lines_read += 1;

        if cancel.is_cancelled() {
            break AssemblyStop::Cancelled;
        }

        let starts_new = opens_entry(&line, delimiter, marker);

        if starts_new && !buffer.is_empty() {
            entries.push(finalize(&buffer, delimiter));
            buffer.clear();
        }

        // Heartbeat on every line, header noise included.
        if last_report.elapsed() >= options.progress_interval {
            on_progress(entries.len());
            last_report = Instant::now();
        }

        if !starts_new && buffer.is_empty() {
            tracing::trace!(
                line = lines_read,
                preview = %preview(&line),
                "Skipping header line"
            );
            continue;
        }

        buffer.push(line);
    };

    match &stop {
        AssemblyStop::EndOfStream => {
            let opens = buffer
                .first()
                .is_some_and(|first| opens_entry(first, delimiter, marker));
            if opens {
                entries.push(finalize(&buffer, delimiter));
            }
        }
        AssemblyStop::Cancelled => {
            tracing::debug!(
                entries = entries.len(),
                dropped_lines = buffer.len(),
                "Assembly cancelled, unfinished entry dropped"
            );
        }
        AssemblyStop::Faulted(e) => {
            tracing::debug!(
                entries = entries.len(),
                error = %e,
                "Assembly stopped by read fault"
            );
        }
    }

    AssemblyReport {
        entries,
        stop,
        lines_read,
    }
}

/// Whether `line` opens a new entry: its marker field is a timestamp.
pub fn opens_entry(line: &str, delimiter: &str, marker_index: usize) -> bool {
    split_fields(line, delimiter)
        .nth(marker_index)
        .and_then(parse_timestamp)
        .is_some()
}

/// Join the buffered lines and re-split the whole text, so delimiters that
/// appear on continuation lines stay attached to the trailing fields.
fn finalize(lines: &[String], delimiter: &str) -> Entry {
    let joined = lines.join(constants::CONTINUATION_SEPARATOR);
    Entry::new(split_fields(&joined, delimiter).map(str::to_string).collect())
}

/// Split on a literal delimiter. An empty delimiter yields the whole text
/// as one field.
fn split_fields<'a>(text: &'a str, delimiter: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
    if delimiter.is_empty() {
        Box::new(std::iter::once(text))
    } else {
        Box::new(text.split(delimiter))
    }
}

/// Read one physical line, decoding invalid UTF-8 lossily and stripping the
/// line terminator (`\n` or `\r\n`). `Ok(None)` at end of stream.
fn read_line_lossy<R: BufRead>(reader: &mut R, scratch: &mut Vec<u8>) -> io::Result<Option<String>> {
    scratch.clear();
    if reader.read_until(b'\n', scratch)? == 0 {
        return Ok(None);
    }
    if scratch.last() == Some(&b'\n') {
        scratch.pop();
        if scratch.last() == Some(&b'\r') {
            scratch.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(scratch).into_owned()))
}

fn preview(line: &str) -> &str {
    match line.char_indices().nth(constants::DEBUG_MAX_LINE_PREVIEW) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

// =============================================================================
// Timestamp grammar
// =============================================================================

/// Date-time layouts accepted for the marker field, tried in order.
/// Fractional seconds are optional in every layout that carries seconds.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Date-only layouts, read as midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a field with the fixed, locale-independent timestamp grammar.
///
/// Surrounding whitespace is ignored. Timestamps carrying an explicit
/// offset (RFC 3339) keep their wall-clock time as written.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    // Cheapest rejection first: every layout starts with a 4-digit year.
    if trimmed.len() < 8 || !trimmed.as_bytes()[..4].iter().all(u8::is_ascii_digit) {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ndt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(nd) = NaiveDate::parse_from_str(trimmed, format) {
            return nd.and_hms_opt(0, 0, 0);
        }
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.naive_local())
}

// =============================================================================
// Row mapping
// =============================================================================

/// Map an assembled entry to a display row. Total: never fails.
///
/// Missing fields map to empty strings and an unparseable timestamp maps to
/// [`unknown_timestamp`]. The message is the line-number field and the
/// message field joined by one space and trimmed; continuation text merged
/// into the message field during assembly comes along with it.
pub fn map_row(entry: &Entry) -> Row {
    let timestamp =
        parse_timestamp(entry.field(constants::FIELD_TIMESTAMP)).unwrap_or_else(unknown_timestamp);

    let message = format!(
        "{} {}",
        entry.field(constants::FIELD_LINE),
        entry.field(constants::FIELD_MESSAGE)
    )
    .trim()
    .to_string();

    Row {
        timestamp,
        level: entry.field(constants::FIELD_LEVEL).to_string(),
        source: entry.field(constants::FIELD_SOURCE).to_string(),
        member: entry.field(constants::FIELD_MEMBER).to_string(),
        message,
    }
}
