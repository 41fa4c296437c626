// LogPane - app/locator.rs
//
// Collaborators that tell the view which file to open.
//
// The view state only depends on these traits, so any host (CLI, GUI,
// tests) can plug in its own directory conventions or file dialog.

use crate::core::discovery;
use crate::util::constants;
use std::path::{Path, PathBuf};

/// Supplies the log directory and the best file to open inside it.
pub trait LogLocator {
    /// Directory holding the application's log files.
    fn log_directory(&self) -> &Path;

    /// The log file the running application is currently writing, if any.
    fn active_log_file(&self) -> Option<PathBuf>;

    /// The most recently modified log file, if any.
    fn latest_log_file(&self) -> Option<PathBuf>;
}

/// Asks the user for a file. `None` means the user cancelled.
pub trait FilePicker {
    fn pick_log_file(&self, start_dir: &Path) -> Option<PathBuf>;
}

/// Filesystem-backed locator.
///
/// The active log file is recognised by the application version and process
/// id embedded in its name. Lookup failures are logged and reported as
/// "nothing found"; they are never fatal.
#[derive(Debug, Clone)]
pub struct FsLocator {
    dir: PathBuf,
    version: String,
    pid: u32,
}

impl FsLocator {
    pub fn new(dir: PathBuf, version: impl Into<String>, pid: u32) -> Self {
        Self {
            dir,
            version: version.into(),
            pid,
        }
    }

    /// Locator for this process: our own pid and the configured version,
    /// falling back to the crate version.
    pub fn for_current_process(dir: PathBuf, version: Option<&str>) -> Self {
        Self::new(
            dir,
            version.unwrap_or(constants::APP_VERSION),
            std::process::id(),
        )
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl LogLocator for FsLocator {
    fn log_directory(&self) -> &Path {
        &self.dir
    }

    fn active_log_file(&self) -> Option<PathBuf> {
        match discovery::find_active_log_file(&self.dir, &self.version, self.pid) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "Active log file lookup failed");
                None
            }
        }
    }

    fn latest_log_file(&self) -> Option<PathBuf> {
        match discovery::latest_log_file(&self.dir) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "Latest log file lookup failed");
                None
            }
        }
    }
}
