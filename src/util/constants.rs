// LogPane - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogPane";

/// Application identifier used for the config directory.
pub const APP_ID: &str = "LogPane";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Log file format
// =============================================================================

/// Field delimiter used by the application logs we read.
pub const DEFAULT_DELIMITER: &str = "|";

/// Field holding the timestamp that opens a new entry.
pub const DEFAULT_MARKER_INDEX: usize = 0;

/// Upper bound on the configurable marker index. Real log layouts have a
/// handful of fields; anything larger is a configuration mistake.
pub const MAX_MARKER_INDEX: usize = 64;

/// Conventional field positions inside an assembled entry.
pub const FIELD_TIMESTAMP: usize = 0;
pub const FIELD_LEVEL: usize = 1;
pub const FIELD_SOURCE: usize = 2;
pub const FIELD_MEMBER: usize = 3;
pub const FIELD_LINE: usize = 4;
pub const FIELD_MESSAGE: usize = 5;

/// Separator used when continuation lines are re-joined before re-splitting.
pub const CONTINUATION_SEPARATOR: &str = "\n";

// =============================================================================
// Read limits
// =============================================================================

/// Default wall-clock budget for one load before it is force-cancelled.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 10;

/// Smallest configurable read budget.
pub const MIN_READ_TIMEOUT_SECS: u64 = 1;

/// Largest configurable read budget.
pub const MAX_READ_TIMEOUT_SECS: u64 = 600;

/// Interval between progress reports sent to the presentation thread while
/// a load is running.
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 40;

/// Bounds for the configurable progress interval.
pub const MIN_PROGRESS_INTERVAL_MS: u64 = 10;
pub const MAX_PROGRESS_INTERVAL_MS: u64 = 1_000;

/// Byte capacity of the buffered reader wrapped around the log file.
pub const READ_BUFFER_BYTES: usize = 4_096;

/// Maximum number of progress messages drained per poll so a burst cannot
/// stall the presentation loop.
pub const MAX_LOAD_MESSAGES_PER_POLL: usize = 256;

// =============================================================================
// Filtering
// =============================================================================

/// A substring filter shorter than this is ignored. One stray keystroke
/// must not collapse the view.
pub const MIN_ACTIVE_FILTER_LEN: usize = 2;

/// Level strings toggled by the hide switches.
pub const LEVEL_INFO: &str = "INFO";
pub const LEVEL_TRACE: &str = "TRACE";
pub const LEVEL_DEBUG: &str = "DEBUG";

// =============================================================================
// Log file discovery
// =============================================================================

/// Directory name for logs under the application data root.
pub const LOG_DIR_NAME: &str = "Logs";

/// Default application data directory name under the local data root.
pub const DEFAULT_APP_DIR: &str = "NINA";

/// Glob used by the latest-log heuristic.
pub const LOG_FILE_GLOB: &str = "*.log";

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a log line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
