// LogPane - app/load.rs
//
// Load lifecycle: the read orchestrator and its background worker.
//
// Architecture:
//   - `load` / `load_with_token` run one read to completion on the calling
//     thread and classify the result into a `ReadOutcome`. They never fail;
//     every fault becomes a status plus a diagnostic cause.
//   - `LoadManager` lives on the presentation thread; `run_load` runs on a
//     background thread and talks to it only through `LoadProgress` messages.
//   - Cancellation is a `CancelToken` whose deadline is armed when the worker
//     starts; the manager can also fire it by hand.

use crate::core::cancel::CancelToken;
use crate::core::model::{LoadProgress, ReadOptions, ReadOutcome, ReadStatus, Row};
use crate::core::parser::{self, AssemblyStop};
use crate::platform::fs as pfs;
use crate::util::constants;
use crate::util::error::ReadError;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Retry limits for transient errors while opening the file.
const MAX_OPEN_RETRIES: u32 = 3;
const OPEN_RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

// =============================================================================
// Read orchestrator
// =============================================================================

/// Read `path` into rows within `timeout`.
///
/// The deadline is armed here; when it expires mid-read the outcome is
/// `Cancelled` with the entries finalised before it fired, or `Empty` when
/// none were.
pub fn load(path: &Path, options: &ReadOptions, timeout: Duration) -> ReadOutcome {
    let cancel = CancelToken::with_deadline(timeout);
    load_with_token(path, options, &cancel, |_| {})
}

/// Read `path` into rows, stopping when `cancel` fires.
///
/// `on_progress` receives the number of finalised entries at most once per
/// `options.progress_interval`.
pub fn load_with_token<F>(
    path: &Path,
    options: &ReadOptions,
    cancel: &CancelToken,
    on_progress: F,
) -> ReadOutcome
where
    F: FnMut(usize),
{
    let started = Instant::now();
    let mut outcome = classify_read(path, options, cancel, started, on_progress);
    outcome.elapsed = started.elapsed();
    log_outcome(&outcome);
    outcome
}

fn classify_read<F>(
    path: &Path,
    options: &ReadOptions,
    cancel: &CancelToken,
    started: Instant,
    on_progress: F,
) -> ReadOutcome
where
    F: FnMut(usize),
{
    let path_buf = path.to_path_buf();

    if !path.exists() {
        return ReadOutcome::new(ReadStatus::NotFound, path_buf.clone())
            .with_cause(ReadError::NotFound { path: path_buf });
    }

    let file = match open_with_retry(path) {
        Ok(f) => f,
        Err(e) => return open_failure(path_buf, e),
    };

    tracing::debug!(
        path = %path.display(),
        delimiter = %options.delimiter,
        marker = options.marker_index,
        "Reading log file"
    );

    let reader = BufReader::with_capacity(constants::READ_BUFFER_BYTES, file);
    let report = parser::assemble(reader, options, cancel, on_progress);

    let rows: Vec<Row> = report.entries.iter().map(parser::map_row).collect();

    tracing::debug!(
        path = %path.display(),
        lines = report.lines_read,
        entries = rows.len(),
        "Assembly finished"
    );

    // Zero rows is Empty even when the deadline fired; only a fault outranks it.
    match report.stop {
        AssemblyStop::Faulted(source) => ReadOutcome::new(ReadStatus::Error, path_buf.clone())
            .with_rows(rows)
            .with_cause(ReadError::Io {
                path: path_buf,
                source,
            }),
        _ if rows.is_empty() => ReadOutcome::new(ReadStatus::Empty, path_buf),
        AssemblyStop::Cancelled => {
            let after = cancel.budget().unwrap_or_else(|| started.elapsed());
            ReadOutcome::new(ReadStatus::Cancelled, path_buf.clone())
                .with_rows(rows)
                .with_cause(ReadError::Cancelled {
                    path: path_buf,
                    after,
                })
        }
        AssemblyStop::EndOfStream => ReadOutcome::new(ReadStatus::Ok, path_buf).with_rows(rows),
    }
}

/// Map an open failure onto the outcome taxonomy.
fn open_failure(path: PathBuf, source: io::Error) -> ReadOutcome {
    if pfs::is_lock_violation(&source) {
        ReadOutcome::new(ReadStatus::Locked, path.clone())
            .with_cause(ReadError::Locked { path, source })
    } else if source.kind() == io::ErrorKind::NotFound {
        // Removed between the existence check and the open.
        ReadOutcome::new(ReadStatus::NotFound, path.clone())
            .with_cause(ReadError::NotFound { path })
    } else {
        ReadOutcome::new(ReadStatus::Error, path.clone()).with_cause(ReadError::Io { path, source })
    }
}

/// Open for shared read, retrying interrupted and timed-out attempts.
fn open_with_retry(path: &Path) -> io::Result<std::fs::File> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..MAX_OPEN_RETRIES {
        match pfs::open_shared_read(path) {
            Ok(file) => return Ok(file),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    path = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient open error, retrying"
                );
                std::thread::sleep(Duration::from_millis(
                    OPEN_RETRY_DELAYS_MS[attempt as usize],
                ));
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("Unknown open error")))
}

/// Lock violations surface as WouldBlock and are not retried.
fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

fn log_outcome(outcome: &ReadOutcome) {
    let path = outcome.path.display();
    let elapsed_ms = outcome.elapsed.as_millis() as u64;
    match outcome.status {
        ReadStatus::Ok => tracing::info!(
            path = %path,
            entries = outcome.rows.len(),
            elapsed_ms,
            "Log file loaded"
        ),
        ReadStatus::Cancelled => tracing::warn!(
            path = %path,
            entries = outcome.rows.len(),
            elapsed_ms,
            "Reading timed out; keeping partial results"
        ),
        ReadStatus::Empty => tracing::error!(path = %path, "The log file is empty"),
        ReadStatus::NotFound => tracing::error!(path = %path, "Log file not found"),
        ReadStatus::Locked | ReadStatus::Error => {
            let cause = outcome
                .cause
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %outcome.status,
                cause = %cause,
                "Failed to read the log file"
            );
        }
        ReadStatus::Idle => {}
    }
}

// =============================================================================
// LoadManager
// =============================================================================

/// Runs one load at a time on a background thread.
pub struct LoadManager {
    progress_rx: Option<mpsc::Receiver<LoadProgress>>,

    /// Cancel token shared with the background thread.
    cancel: Option<CancelToken>,

    /// True from `start` until `Finished` (or a dead worker) is observed.
    in_flight: bool,
}

impl LoadManager {
    pub fn new() -> Self {
        Self {
            progress_rx: None,
            cancel: None,
            in_flight: false,
        }
    }

    /// Start loading `path` on a background thread.
    ///
    /// Returns `false` without doing anything while a load is in flight;
    /// the running load is neither cancelled nor queued behind.
    pub fn start(&mut self, path: PathBuf, options: ReadOptions, timeout: Duration) -> bool {
        if self.in_flight {
            tracing::debug!(path = %path.display(), "Load already in flight, request rejected");
            return false;
        }

        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::with_deadline(timeout);

        self.progress_rx = Some(rx);
        self.cancel = Some(cancel.clone());
        self.in_flight = true;

        tracing::info!(path = %path.display(), timeout_secs = timeout.as_secs(), "Load started");

        std::thread::spawn(move || {
            run_load(path, options, cancel, tx);
        });

        true
    }

    /// Fire the cancel token of the running load. The worker still sends
    /// `Finished` with a `Cancelled` outcome.
    pub fn cancel(&self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.in_flight
    }

    /// Drain pending messages without blocking, at most
    /// `MAX_LOAD_MESSAGES_PER_POLL` per call.
    pub fn poll_progress(&mut self) -> Vec<LoadProgress> {
        let mut messages = Vec::new();
        let Some(rx) = &self.progress_rx else {
            return messages;
        };

        let mut disconnected = false;
        while messages.len() < constants::MAX_LOAD_MESSAGES_PER_POLL {
            match rx.try_recv() {
                Ok(msg) => messages.push(msg),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        self.observe(&messages, disconnected);
        messages
    }

    /// Block until the next message arrives. `None` once the worker is gone
    /// and every message has been taken.
    pub fn recv_blocking(&mut self) -> Option<LoadProgress> {
        let rx = self.progress_rx.as_ref()?;
        match rx.recv() {
            Ok(msg) => {
                self.observe(std::slice::from_ref(&msg), false);
                Some(msg)
            }
            Err(_) => {
                self.observe(&[], true);
                None
            }
        }
    }

    fn observe(&mut self, messages: &[LoadProgress], disconnected: bool) {
        let finished = messages
            .iter()
            .any(|m| matches!(m, LoadProgress::Finished(_)));
        if finished || disconnected {
            if disconnected && !finished && self.in_flight {
                tracing::warn!("Load worker exited without a result");
            }
            self.in_flight = false;
            self.cancel = None;
            if disconnected {
                self.progress_rx = None;
            }
        }
    }
}

impl Default for LoadManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Background half of a load. Sends `Started`, any number of `Progress`
/// heartbeats, then exactly one `Finished`.
fn run_load(
    path: PathBuf,
    options: ReadOptions,
    cancel: CancelToken,
    tx: mpsc::Sender<LoadProgress>,
) {
    if tx
        .send(LoadProgress::Started { path: path.clone() })
        .is_err()
    {
        return; // Receiver dropped; nobody is waiting for this load.
    }

    let tx_progress = tx.clone();
    let outcome = load_with_token(&path, &options, &cancel, |entries| {
        // Non-fatal: the receiver may have gone away mid-read.
        let _ = tx_progress.send(LoadProgress::Progress { entries });
    });

    let _ = tx.send(LoadProgress::Finished(outcome));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = "noise|x\n\
2025-01-01 12:00:00|INFO|Core|A|Line1|Msg1\n\
cont|ofmsg1\n\
2025-01-01 12:00:01|WARN|Core|B||Msg2\n";

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn wait_for_outcome(manager: &mut LoadManager) -> ReadOutcome {
        loop {
            match manager.recv_blocking() {
                Some(LoadProgress::Finished(outcome)) => return outcome,
                Some(_) => continue,
                None => panic!("worker exited without Finished"),
            }
        }
    }

    #[test]
    fn test_load_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.log", SAMPLE);

        let outcome = load(&path, &ReadOptions::default(), Duration::from_secs(10));
        assert_eq!(outcome.status, ReadStatus::Ok);
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].level, "INFO");
        assert_eq!(outcome.rows[1].level, "WARN");
        assert!(outcome.cause.is_none());
        assert_eq!(outcome.message(), "Loaded 2 log entries");
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = load(
            &dir.path().join("missing.log"),
            &ReadOptions::default(),
            Duration::from_secs(10),
        );
        assert_eq!(outcome.status, ReadStatus::NotFound);
        assert!(outcome.rows.is_empty());
        assert!(matches!(outcome.cause, Some(ReadError::NotFound { .. })));
    }

    #[test]
    fn test_load_without_timestamps_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.log", "header|x\nmore|noise\n");
        let outcome = load(&path, &ReadOptions::default(), Duration::from_secs(10));
        assert_eq!(outcome.status, ReadStatus::Empty);
        assert!(outcome.rows.is_empty());
    }

    #[test]
    fn test_expired_deadline_without_entries_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.log", SAMPLE);
        let outcome = load(&path, &ReadOptions::default(), Duration::ZERO);
        assert_eq!(outcome.status, ReadStatus::Empty);
        assert!(outcome.rows.is_empty());
        assert!(outcome.cause.is_none());
        assert_eq!(outcome.message(), "The selected log file is empty.");
    }

    #[test]
    fn test_deadline_after_entries_is_cancelled_with_those_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.log", SAMPLE);
        let options = ReadOptions {
            progress_interval: Duration::ZERO,
            ..ReadOptions::default()
        };
        let cancel = CancelToken::with_deadline(Duration::from_millis(200));

        // Stall once the first entry is finalised so the deadline passes.
        let mut stalled = false;
        let outcome = load_with_token(&path, &options, &cancel, |entries| {
            if entries == 1 && !stalled {
                stalled = true;
                std::thread::sleep(Duration::from_millis(400));
            }
        });

        assert_eq!(outcome.status, ReadStatus::Cancelled);
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].level, "INFO");
        assert!(matches!(
            outcome.cause,
            Some(ReadError::Cancelled { after, .. }) if after == Duration::from_millis(200)
        ));
        assert_eq!(
            outcome.message(),
            "Reading timed out after 0 seconds. Showing partial results."
        );
    }

    #[test]
    fn test_directory_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = load(dir.path(), &ReadOptions::default(), Duration::from_secs(10));
        // Opening a directory fails on Windows; reading it fails on Unix.
        assert_eq!(outcome.status, ReadStatus::Error);
        assert!(outcome.rows.is_empty());
        assert!(outcome.cause.is_some());
    }

    #[test]
    fn test_open_failure_classification() {
        let path = PathBuf::from("a.log");
        let locked = open_failure(
            path.clone(),
            io::Error::new(io::ErrorKind::WouldBlock, "locked"),
        );
        assert_eq!(locked.status, ReadStatus::Locked);
        assert!(locked.message().starts_with("File locked by another process."));

        let gone = open_failure(path.clone(), io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(gone.status, ReadStatus::NotFound);

        let denied = open_failure(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(denied.status, ReadStatus::Error);
    }

    #[test]
    fn test_manager_runs_load_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.log", SAMPLE);

        let mut manager = LoadManager::new();
        assert!(manager.start(path.clone(), ReadOptions::default(), Duration::from_secs(10)));
        assert!(manager.is_active());

        let outcome = wait_for_outcome(&mut manager);
        assert_eq!(outcome.status, ReadStatus::Ok);
        assert_eq!(outcome.path, path);
        assert!(!manager.is_active());
    }

    #[test]
    fn test_manager_rejects_second_load() {
        let dir = tempfile::tempdir().unwrap();
        let first = write(&dir, "a.log", SAMPLE);
        let second = write(&dir, "b.log", SAMPLE);

        let mut manager = LoadManager::new();
        assert!(manager.start(first.clone(), ReadOptions::default(), Duration::from_secs(10)));
        assert!(!manager.start(second, ReadOptions::default(), Duration::from_secs(10)));

        let outcome = wait_for_outcome(&mut manager);
        assert_eq!(outcome.path, first);

        // Accepted again once the first load is observed as finished.
        let third = write(&dir, "c.log", SAMPLE);
        assert!(manager.start(third, ReadOptions::default(), Duration::from_secs(10)));
        wait_for_outcome(&mut manager);
    }

    #[test]
    fn test_manager_sends_started_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.log", SAMPLE);

        let mut manager = LoadManager::new();
        manager.start(path, ReadOptions::default(), Duration::from_secs(10));
        assert!(matches!(
            manager.recv_blocking(),
            Some(LoadProgress::Started { .. })
        ));
        wait_for_outcome(&mut manager);
    }

    #[test]
    fn test_idle_manager_polls_nothing() {
        let mut manager = LoadManager::new();
        assert!(manager.poll_progress().is_empty());
        assert!(manager.recv_blocking().is_none());
        assert!(!manager.is_active());
    }
}
