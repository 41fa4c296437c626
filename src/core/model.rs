// LogPane - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants;
use crate::util::error::ReadError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Timestamp given to rows whose timestamp field cannot be parsed:
/// `0001-01-01T00:00:00`.
///
/// Display and ordering code must treat it as "unknown", see
/// [`Row::has_timestamp`]. The timestamp filter still sees it formatted as
/// `0001-01-01  00:00:00.0000`.
pub fn unknown_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

// =============================================================================
// Entry (output of assembly)
// =============================================================================

/// One logical log record before field mapping: the primary line plus any
/// continuation lines, re-split on the delimiter as a single text.
///
/// Continuation text therefore ends up inside the trailing field(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub fields: Vec<String>,
}

impl Entry {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Field at `index`, or `""` when the entry is shorter.
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// =============================================================================
// Row (presentation-ready record)
// =============================================================================

/// A structured log record used for display and filtering.
///
/// Immutable once built; rows are shared with the view as `Arc<[Row]>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// Parsed timestamp, or [`unknown_timestamp`].
    pub timestamp: NaiveDateTime,
    pub level: String,
    pub source: String,
    pub member: String,
    /// Line number and message text joined by one space, trimmed.
    pub message: String,
}

impl Row {
    /// False when the timestamp is the unknown sentinel.
    pub fn has_timestamp(&self) -> bool {
        self.timestamp != unknown_timestamp()
    }
}

// =============================================================================
// Read options
// =============================================================================

/// How a file is split into entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Literal field delimiter (not a regex).
    pub delimiter: String,

    /// Field expected to hold the timestamp that opens a new entry.
    pub marker_index: usize,

    /// Minimum wall-clock gap between progress reports.
    pub progress_interval: Duration,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: constants::DEFAULT_DELIMITER.to_string(),
            marker_index: constants::DEFAULT_MARKER_INDEX,
            progress_interval: Duration::from_millis(constants::DEFAULT_PROGRESS_INTERVAL_MS),
        }
    }
}

// =============================================================================
// Read outcome
// =============================================================================

/// Machine-readable classification of one load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadStatus {
    /// No load has completed yet.
    #[default]
    Idle,
    Ok,
    Empty,
    NotFound,
    Locked,
    Cancelled,
    Error,
}

impl ReadStatus {
    /// Stable status code for scripts and status bars.
    pub fn code(&self) -> &'static str {
        match self {
            ReadStatus::Idle => "idle",
            ReadStatus::Ok => "ok",
            ReadStatus::Empty => "empty",
            ReadStatus::NotFound => "not_found",
            ReadStatus::Locked => "locked",
            ReadStatus::Cancelled => "cancelled",
            ReadStatus::Error => "error",
        }
    }

    /// Whether rows from an outcome with this status replace the view.
    pub fn publishes_rows(&self) -> bool {
        matches!(self, ReadStatus::Ok | ReadStatus::Cancelled)
    }
}

impl std::fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of one load attempt, produced once and consumed once.
#[derive(Debug)]
pub struct ReadOutcome {
    pub status: ReadStatus,

    /// Complete for Ok, partial for Cancelled, empty for NotFound and Locked.
    /// Holds whatever was assembled before the fault for Error.
    pub rows: Vec<Row>,

    /// Diagnostic cause for every status except Ok and Empty.
    pub cause: Option<ReadError>,

    /// File that was read.
    pub path: PathBuf,

    /// Wall-clock time spent on the load.
    pub elapsed: Duration,
}

impl ReadOutcome {
    pub fn new(status: ReadStatus, path: PathBuf) -> Self {
        Self {
            status,
            rows: Vec::new(),
            cause: None,
            path,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_cause(mut self, cause: ReadError) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Human-readable message for the status bar.
    pub fn message(&self) -> String {
        let cause = self
            .cause
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_default();
        match self.status {
            ReadStatus::Idle => "Ready.".to_string(),
            ReadStatus::Ok => format!("Loaded {} log entries", self.rows.len()),
            ReadStatus::Empty => "The selected log file is empty.".to_string(),
            ReadStatus::NotFound => "No log file found.".to_string(),
            ReadStatus::Locked => format!("File locked by another process.\n{cause}"),
            ReadStatus::Cancelled => {
                let secs = match &self.cause {
                    Some(ReadError::Cancelled { after, .. }) => after.as_secs(),
                    _ => constants::DEFAULT_READ_TIMEOUT_SECS,
                };
                format!("Reading timed out after {secs} seconds. Showing partial results.")
            }
            ReadStatus::Error => {
                format!("An error occurred while reading the log file.\n{cause}")
            }
        }
    }
}

// =============================================================================
// Load progress (for presentation updates)
// =============================================================================

/// Messages sent from the load thread to the presentation thread.
#[derive(Debug)]
pub enum LoadProgress {
    /// The worker opened the file and started reading.
    Started { path: PathBuf },

    /// Periodic heartbeat with the number of entries finalised so far.
    Progress { entries: usize },

    /// Terminal message; exactly one per load.
    Finished(ReadOutcome),
}

/// Shared, immutable row set published to the view.
pub type RowSet = Arc<[Row]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_field_out_of_range_is_empty() {
        let entry = Entry::new(vec!["a".to_string()]);
        assert_eq!(entry.field(0), "a");
        assert_eq!(entry.field(5), "");
    }

    #[test]
    fn test_status_codes_are_stable() {
        assert_eq!(ReadStatus::NotFound.code(), "not_found");
        assert_eq!(ReadStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_only_ok_and_cancelled_publish_rows() {
        assert!(ReadStatus::Ok.publishes_rows());
        assert!(ReadStatus::Cancelled.publishes_rows());
        assert!(!ReadStatus::Empty.publishes_rows());
        assert!(!ReadStatus::Error.publishes_rows());
    }

    #[test]
    fn test_cancelled_message_uses_budget() {
        let outcome = ReadOutcome::new(ReadStatus::Cancelled, PathBuf::from("a.log")).with_cause(
            ReadError::Cancelled {
                path: PathBuf::from("a.log"),
                after: Duration::from_secs(3),
            },
        );
        assert_eq!(
            outcome.message(),
            "Reading timed out after 3 seconds. Showing partial results."
        );
    }

    #[test]
    fn test_unknown_timestamp_is_year_one() {
        assert_eq!(
            unknown_timestamp().format("%Y-%m-%d %H:%M:%S").to_string(),
            "0001-01-01 00:00:00"
        );
        let row = Row {
            timestamp: unknown_timestamp(),
            level: String::new(),
            source: String::new(),
            member: String::new(),
            message: String::new(),
        };
        assert!(!row.has_timestamp());
    }
}
