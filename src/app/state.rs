// LogPane - app/state.rs
//
// View state for one log view: the published row set, the filter criteria,
// the visible-row indices and the status line.
//
// All mutation happens on the thread that owns this struct. Loads run on the
// `LoadManager` worker and reach the view only through `poll()`, which
// publishes a finished load in a single `&mut self` call.

use crate::app::load::LoadManager;
use crate::app::locator::{FilePicker, LogLocator};
use crate::core::filter::{self, FilterCriteria, FilterField};
use crate::core::model::{LoadProgress, ReadOptions, ReadOutcome, ReadStatus, Row, RowSet};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

/// View-model for a single log view.
pub struct LogViewState {
    /// Published rows. Replaced wholesale, never mutated in place.
    rows: RowSet,

    /// Indices into `rows` that pass the current criteria.
    filtered_indices: Vec<usize>,

    criteria: FilterCriteria,

    /// Subscription to `criteria` changes.
    filter_rx: mpsc::Receiver<FilterField>,

    loader: LoadManager,

    options: ReadOptions,
    timeout: Duration,

    /// Status of the most recent finished load (or load attempt).
    last_status: ReadStatus,

    /// Status bar text.
    status_message: String,

    /// File name (no directory) of the file the rows came from.
    selected_file: Option<String>,

    /// Path of the load in flight, if any.
    loading_path: Option<PathBuf>,

    /// Entries assembled so far by the load in flight.
    entries_loaded: usize,
}

impl LogViewState {
    pub fn new(options: ReadOptions, timeout: Duration) -> Self {
        let mut criteria = FilterCriteria::new();
        let filter_rx = criteria.subscribe();
        Self {
            rows: Arc::from(Vec::<Row>::new()),
            filtered_indices: Vec::new(),
            criteria,
            filter_rx,
            loader: LoadManager::new(),
            options,
            timeout,
            last_status: ReadStatus::Idle,
            status_message: "Ready.".to_string(),
            selected_file: None,
            loading_path: None,
            entries_loaded: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Start loading `path` in the background.
    ///
    /// Returns `false` while another load is in flight; that load keeps
    /// running and this request is dropped.
    pub fn start_load(&mut self, path: PathBuf) -> bool {
        if !self
            .loader
            .start(path.clone(), self.options.clone(), self.timeout)
        {
            return false;
        }
        self.status_message = format!("Loading {}...", display_name(&path));
        self.loading_path = Some(path);
        self.entries_loaded = 0;
        true
    }

    /// Load the file the running application is writing.
    ///
    /// No fallback: when no active file exists the status becomes NotFound
    /// and the current rows stay.
    pub fn load_active(&mut self, locator: &dyn LogLocator) -> bool {
        if self.is_loading() {
            return false;
        }
        match locator.active_log_file() {
            Some(path) => self.start_load(path),
            None => {
                self.report_no_log_file(locator.log_directory());
                false
            }
        }
    }

    /// Load the active log file, falling back to the most recent one.
    /// Each lookup runs once; when both come up empty the status becomes
    /// NotFound.
    pub fn load_active_or_latest(&mut self, locator: &dyn LogLocator) -> bool {
        if self.is_loading() {
            return false;
        }
        match locator
            .active_log_file()
            .or_else(|| locator.latest_log_file())
        {
            Some(path) => self.start_load(path),
            None => {
                self.report_no_log_file(locator.log_directory());
                false
            }
        }
    }

    fn report_no_log_file(&mut self, dir: &Path) {
        tracing::error!(dir = %dir.display(), "No log file found");
        self.set_status(ReadStatus::NotFound, "No log file found.".to_string());
    }

    /// Ask `picker` for a file and load it. Cancelling the picker is a no-op.
    pub fn browse(&mut self, picker: &dyn FilePicker, start_dir: &Path) -> bool {
        if self.is_loading() {
            return false;
        }
        match picker.pick_log_file(start_dir) {
            Some(path) => self.start_load(path),
            None => {
                tracing::debug!("File picker cancelled");
                false
            }
        }
    }

    /// Fire the cancel token of the load in flight.
    pub fn cancel_load(&self) {
        self.loader.cancel();
    }

    // -------------------------------------------------------------------------
    // Event pump
    // -------------------------------------------------------------------------

    /// Apply pending load messages and filter changes. Never blocks.
    ///
    /// Returns true when anything visible changed.
    pub fn poll(&mut self) -> bool {
        let messages = self.loader.poll_progress();
        let mut changed = !messages.is_empty();
        for msg in messages {
            self.handle_progress(msg);
        }
        changed |= self.drain_filter_changes();
        changed
    }

    /// Block until the load in flight finishes and is published.
    /// Returns immediately when nothing is loading.
    pub fn wait_until_idle(&mut self) {
        while self.is_loading() {
            match self.loader.recv_blocking() {
                Some(msg) => self.handle_progress(msg),
                None => break,
            }
        }
        if !self.loader.is_active() {
            self.loading_path = None;
        }
        self.drain_filter_changes();
    }

    fn handle_progress(&mut self, msg: LoadProgress) {
        match msg {
            LoadProgress::Started { path } => {
                tracing::debug!(path = %path.display(), "Load worker started");
            }
            LoadProgress::Progress { entries } => {
                self.entries_loaded = entries;
                self.status_message = format!("Loading... {entries} entries");
            }
            LoadProgress::Finished(outcome) => {
                self.loading_path = None;
                self.publish(outcome);
            }
        }
    }

    /// Swap in a finished load. Rows, file name, visible indices and status
    /// change together.
    fn publish(&mut self, outcome: ReadOutcome) {
        let message = outcome.message();
        let status = outcome.status;

        if status.publishes_rows() {
            self.selected_file = Some(display_name(&outcome.path));
            self.rows = Arc::from(outcome.rows);
            self.refresh_filters();
        } else if status == ReadStatus::Empty {
            self.selected_file = Some(display_name(&outcome.path));
        }

        self.set_status(status, message);
    }

    fn drain_filter_changes(&mut self) -> bool {
        let mut changed = false;
        while let Ok(field) = self.filter_rx.try_recv() {
            tracing::trace!(?field, "Re-filtering after criteria change");
            changed = true;
        }
        if changed {
            self.refresh_filters();
        }
        changed
    }

    /// Recompute visible indices from the current rows and criteria.
    pub fn refresh_filters(&mut self) {
        self.filtered_indices = filter::apply_filters(&self.rows, &self.criteria);
    }

    fn set_status(&mut self, status: ReadStatus, message: String) {
        self.last_status = status;
        self.status_message = message;
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn is_loading(&self) -> bool {
        self.loader.is_active()
    }

    pub fn rows(&self) -> &RowSet {
        &self.rows
    }

    pub fn filtered_indices(&self) -> &[usize] {
        &self.filtered_indices
    }

    /// Rows passing the current criteria, in file order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.filtered_indices
            .iter()
            .filter_map(move |&idx| self.rows.get(idx))
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Mutable criteria. Changes take effect on the next `poll()`.
    pub fn criteria_mut(&mut self) -> &mut FilterCriteria {
        &mut self.criteria
    }

    pub fn last_status(&self) -> ReadStatus {
        self.last_status
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn selected_file(&self) -> Option<&str> {
        self.selected_file.as_deref()
    }

    pub fn loading_path(&self) -> Option<&Path> {
        self.loading_path.as_deref()
    }

    pub fn entries_loaded(&self) -> usize {
        self.entries_loaded
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;

    const SAMPLE: &str = "2025-09-11 20:15:30.000|INFO|Core.cs|Start|10|Camera connected\n\
2025-09-11 20:16:00.000|WARN|Mount.cs|Slew|22|Slew slow\n\
2025-09-11 20:17:00.000|DEBUG|Core.cs|Tick|31|heartbeat\n";

    struct NoActive;

    impl LogLocator for NoActive {
        fn log_directory(&self) -> &Path {
            Path::new("Logs")
        }
        fn active_log_file(&self) -> Option<PathBuf> {
            None
        }
        fn latest_log_file(&self) -> Option<PathBuf> {
            None
        }
    }

    /// Counts lookups and finds `latest` only.
    #[derive(Default)]
    struct CountingLocator {
        latest: Option<PathBuf>,
        active_calls: Cell<usize>,
        latest_calls: Cell<usize>,
    }

    impl LogLocator for CountingLocator {
        fn log_directory(&self) -> &Path {
            Path::new("Logs")
        }
        fn active_log_file(&self) -> Option<PathBuf> {
            self.active_calls.set(self.active_calls.get() + 1);
            None
        }
        fn latest_log_file(&self) -> Option<PathBuf> {
            self.latest_calls.set(self.latest_calls.get() + 1);
            self.latest.clone()
        }
    }

    struct Cancelled;

    impl FilePicker for Cancelled {
        fn pick_log_file(&self, _start_dir: &Path) -> Option<PathBuf> {
            None
        }
    }

    fn view() -> LogViewState {
        LogViewState::new(ReadOptions::default(), Duration::from_secs(10))
    }

    fn loaded_view(dir: &tempfile::TempDir) -> LogViewState {
        let path = dir.path().join("a.log");
        fs::write(&path, SAMPLE).unwrap();
        let mut state = view();
        assert!(state.start_load(path));
        state.wait_until_idle();
        state
    }

    #[test]
    fn test_initial_state() {
        let state = view();
        assert_eq!(state.last_status(), ReadStatus::Idle);
        assert!(state.rows().is_empty());
        assert!(!state.is_loading());
        assert_eq!(state.selected_file(), None);
    }

    #[test]
    fn test_load_publishes_rows_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let state = loaded_view(&dir);
        assert_eq!(state.last_status(), ReadStatus::Ok);
        assert_eq!(state.status_message(), "Loaded 3 log entries");
        assert_eq!(state.rows().len(), 3);
        assert_eq!(state.filtered_indices(), &[0, 1, 2]);
        assert_eq!(state.selected_file(), Some("a.log"));
        assert!(state.loading_path().is_none());
    }

    #[test]
    fn test_filter_change_refreshes_on_poll() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_view(&dir);

        state.criteria_mut().set_hide_info(true);
        assert!(state.poll());
        let levels: Vec<&str> = state.visible_rows().map(|r| r.level.as_str()).collect();
        assert_eq!(levels, vec!["WARN", "DEBUG"]);

        state
            .criteria_mut()
            .set_text(FilterField::Source, Some("mount".to_string()));
        state.poll();
        assert_eq!(state.filtered_indices(), &[1]);

        state.criteria_mut().clear();
        state.poll();
        assert_eq!(state.filtered_indices().len(), 3);
    }

    #[test]
    fn test_failed_load_keeps_previous_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_view(&dir);

        assert!(state.start_load(dir.path().join("missing.log")));
        state.wait_until_idle();
        assert_eq!(state.last_status(), ReadStatus::NotFound);
        assert_eq!(state.status_message(), "No log file found.");
        assert_eq!(state.rows().len(), 3);
        assert_eq!(state.selected_file(), Some("a.log"));
    }

    #[test]
    fn test_empty_load_updates_file_name_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_view(&dir);

        let empty = dir.path().join("empty.log");
        fs::write(&empty, "").unwrap();
        assert!(state.start_load(empty));
        state.wait_until_idle();
        assert_eq!(state.last_status(), ReadStatus::Empty);
        assert_eq!(state.status_message(), "The selected log file is empty.");
        assert_eq!(state.selected_file(), Some("empty.log"));
        assert_eq!(state.rows().len(), 3);
    }

    #[test]
    fn test_second_load_rejected_while_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.log");
        let second = dir.path().join("b.log");
        fs::write(&first, SAMPLE).unwrap();
        fs::write(&second, SAMPLE).unwrap();

        let mut state = view();
        assert!(state.start_load(first.clone()));
        assert!(!state.start_load(second));
        assert_eq!(state.loading_path(), Some(first.as_path()));
        state.wait_until_idle();
        assert_eq!(state.selected_file(), Some("a.log"));
    }

    #[test]
    fn test_load_active_without_file_is_not_found() {
        let mut state = view();
        assert!(!state.load_active(&NoActive));
        assert_eq!(state.last_status(), ReadStatus::NotFound);
        assert_eq!(state.status_message(), "No log file found.");
    }

    #[test]
    fn test_no_active_or_latest_file_looks_up_each_once() {
        let locator = CountingLocator::default();
        let mut state = view();
        assert!(!state.load_active_or_latest(&locator));
        assert_eq!(state.last_status(), ReadStatus::NotFound);
        assert_eq!(state.status_message(), "No log file found.");
        assert_eq!(locator.active_calls.get(), 1);
        assert_eq!(locator.latest_calls.get(), 1);
    }

    #[test]
    fn test_falls_back_to_latest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latest.log");
        fs::write(&path, SAMPLE).unwrap();
        let locator = CountingLocator {
            latest: Some(path),
            ..CountingLocator::default()
        };

        let mut state = view();
        assert!(state.load_active_or_latest(&locator));
        state.wait_until_idle();
        assert_eq!(state.last_status(), ReadStatus::Ok);
        assert_eq!(state.selected_file(), Some("latest.log"));
        assert_eq!(locator.active_calls.get(), 1);
    }

    #[test]
    fn test_browse_cancelled_is_noop() {
        let mut state = view();
        assert!(!state.browse(&Cancelled, Path::new(".")));
        assert_eq!(state.last_status(), ReadStatus::Idle);
        assert_eq!(state.status_message(), "Ready.");
    }
}
