// LogPane - platform/config.rs
//
// Platform directory resolution and config.toml loading with startup
// validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::model::ReadOptions;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::{BaseDirs, ProjectDirs};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved platform paths.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// LogPane's own configuration directory (holds config.toml).
    pub config_dir: PathBuf,

    /// Per-user local application data root (%LOCALAPPDATA%,
    /// ~/.local/share, ~/Library/Application Support).
    pub data_local_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        let config_dir = ProjectDirs::from("", "", constants::APP_ID)
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| {
                tracing::warn!("Could not determine config directory, using current directory");
                PathBuf::from(".")
            });

        let data_local_dir = BaseDirs::new()
            .map(|b| b.data_local_dir().to_path_buf())
            .unwrap_or_else(|| {
                tracing::warn!("Could not determine data directory, using current directory");
                PathBuf::from(".")
            });

        tracing::debug!(
            config = %config_dir.display(),
            data = %data_local_dir.display(),
            "Platform paths resolved"
        );

        Self {
            config_dir,
            data_local_dir,
        }
    }

    /// Default log directory of the application whose data directory is
    /// named `app_dir`, e.g. `%LOCALAPPDATA%\NINA\Logs`.
    pub fn log_dir(&self, app_dir: &str) -> PathBuf {
        self.data_local_dir
            .join(app_dir)
            .join(constants::LOG_DIR_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub reader: ReaderSection,
    pub locator: LocatorSection,
    pub filters: FiltersSection,
    pub logging: LoggingSection,
}

/// `[reader]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ReaderSection {
    /// Literal field delimiter.
    pub delimiter: Option<String>,
    /// Field holding the entry-opening timestamp.
    pub marker_index: Option<usize>,
    /// Read budget in seconds.
    pub timeout_secs: Option<u64>,
    /// Progress report interval in ms.
    pub progress_interval_ms: Option<u64>,
}

/// `[locator]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LocatorSection {
    /// Explicit log directory (overrides the platform default).
    pub log_directory: Option<String>,
    /// Application data directory name under the local data root.
    pub app_dir: Option<String>,
    /// Version string embedded in active log file names.
    pub app_version: Option<String>,
}

/// `[filters]` config section: initial toggle state.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct FiltersSection {
    pub hide_info: Option<bool>,
    pub hide_trace: Option<bool>,
    pub hide_debug: Option<bool>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Reader --
    pub delimiter: String,
    pub marker_index: usize,
    pub timeout: Duration,
    pub progress_interval: Duration,

    // -- Locator --
    pub log_directory: Option<PathBuf>,
    pub app_dir: String,
    pub app_version: Option<String>,

    // -- Filters --
    pub hide_info: bool,
    pub hide_trace: bool,
    pub hide_debug: bool,

    // -- Logging --
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            delimiter: constants::DEFAULT_DELIMITER.to_string(),
            marker_index: constants::DEFAULT_MARKER_INDEX,
            timeout: Duration::from_secs(constants::DEFAULT_READ_TIMEOUT_SECS),
            progress_interval: Duration::from_millis(constants::DEFAULT_PROGRESS_INTERVAL_MS),
            log_directory: None,
            app_dir: constants::DEFAULT_APP_DIR.to_string(),
            app_version: None,
            hide_info: false,
            hide_trace: false,
            hide_debug: false,
            log_level: None,
        }
    }
}

impl AppConfig {
    /// Reader settings for a load.
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            delimiter: self.delimiter.clone(),
            marker_index: self.marker_index,
            progress_interval: self.progress_interval,
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// A missing file yields defaults with no warnings (first run); an unreadable
/// or unparseable file yields defaults plus a warning, so startup never fails
/// on configuration.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    match load_config_file(&config_path) {
        Ok(result) => result,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Load and validate an explicit config file. Read and parse failures are
/// errors here; range problems are still warnings.
pub fn load_config_file(path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let raw: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), "Loaded config.toml");
    Ok(validate(raw))
}

/// Record an out-of-range value as a warning string.
fn out_of_range(warnings: &mut Vec<String>, field: &str, value: impl ToString, expected: String) {
    let err = ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected,
    };
    warnings.push(format!("{err}. Using default."));
}

/// Validate each field, accumulating every problem rather than stopping at
/// the first.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Reader: delimiter --
    if let Some(delimiter) = raw.reader.delimiter {
        if delimiter.is_empty() {
            out_of_range(
                &mut warnings,
                "reader.delimiter",
                "",
                "a non-empty string".to_string(),
            );
        } else {
            config.delimiter = delimiter;
        }
    }

    // -- Reader: marker_index --
    if let Some(index) = raw.reader.marker_index {
        if index <= constants::MAX_MARKER_INDEX {
            config.marker_index = index;
        } else {
            out_of_range(
                &mut warnings,
                "reader.marker_index",
                index,
                format!("0-{}", constants::MAX_MARKER_INDEX),
            );
        }
    }

    // -- Reader: timeout_secs --
    if let Some(secs) = raw.reader.timeout_secs {
        if (constants::MIN_READ_TIMEOUT_SECS..=constants::MAX_READ_TIMEOUT_SECS).contains(&secs) {
            config.timeout = Duration::from_secs(secs);
        } else {
            out_of_range(
                &mut warnings,
                "reader.timeout_secs",
                secs,
                format!(
                    "{}-{}",
                    constants::MIN_READ_TIMEOUT_SECS,
                    constants::MAX_READ_TIMEOUT_SECS
                ),
            );
        }
    }

    // -- Reader: progress_interval_ms --
    if let Some(ms) = raw.reader.progress_interval_ms {
        if (constants::MIN_PROGRESS_INTERVAL_MS..=constants::MAX_PROGRESS_INTERVAL_MS).contains(&ms)
        {
            config.progress_interval = Duration::from_millis(ms);
        } else {
            out_of_range(
                &mut warnings,
                "reader.progress_interval_ms",
                ms,
                format!(
                    "{}-{}",
                    constants::MIN_PROGRESS_INTERVAL_MS,
                    constants::MAX_PROGRESS_INTERVAL_MS
                ),
            );
        }
    }

    // -- Locator --
    if let Some(dir) = raw.locator.log_directory.filter(|d| !d.trim().is_empty()) {
        config.log_directory = Some(PathBuf::from(dir));
    }
    if let Some(app_dir) = raw.locator.app_dir {
        if app_dir.trim().is_empty() {
            out_of_range(
                &mut warnings,
                "locator.app_dir",
                "",
                "a directory name".to_string(),
            );
        } else {
            config.app_dir = app_dir;
        }
    }
    config.app_version = raw.locator.app_version.filter(|v| !v.trim().is_empty());

    // -- Filters --
    config.hide_info = raw.filters.hide_info.unwrap_or(false);
    config.hide_trace = raw.filters.hide_trace.unwrap_or(false);
    config.hide_debug = raw.filters.hide_debug.unwrap_or(false);

    // -- Logging: level --
    if let Some(level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level);
        } else {
            out_of_range(
                &mut warnings,
                "logging.level",
                &level,
                "one of error, warn, info, debug, trace".to_string(),
            );
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> (AppConfig, Vec<String>) {
        validate(toml::from_str(toml_text).expect("valid toml"))
    }

    #[test]
    fn test_defaults_when_empty() {
        let (config, warnings) = parse("");
        assert!(warnings.is_empty());
        assert_eq!(config.delimiter, "|");
        assert_eq!(config.marker_index, 0);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.progress_interval, Duration::from_millis(40));
    }

    #[test]
    fn test_valid_values_are_applied() {
        let (config, warnings) = parse(
            r#"
[reader]
delimiter = ";"
marker_index = 2
timeout_secs = 30
progress_interval_ms = 100

[locator]
log_directory = "/var/log/app"
app_version = "3.1.2.9001"

[filters]
hide_trace = true

[logging]
level = "debug"
"#,
        );
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.delimiter, ";");
        assert_eq!(config.marker_index, 2);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.log_directory, Some(PathBuf::from("/var/log/app")));
        assert_eq!(config.app_version.as_deref(), Some("3.1.2.9001"));
        assert!(config.hide_trace);
        assert!(!config.hide_info);
        assert_eq!(config.log_level.as_deref(), Some("debug"));

        let options = config.read_options();
        assert_eq!(options.delimiter, ";");
        assert_eq!(options.progress_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_out_of_range_values_warn_and_fall_back() {
        let (config, warnings) = parse(
            r#"
[reader]
delimiter = ""
marker_index = 1000
timeout_secs = 0

[logging]
level = "loud"
"#,
        );
        assert_eq!(warnings.len(), 4, "warnings: {warnings:?}");
        assert_eq!(config.delimiter, "|");
        assert_eq!(config.marker_index, 0);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let (_, warnings) = parse("[future]\nshiny = true\n");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missing_config_dir_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(&dir.path().join("nope"));
        assert!(warnings.is_empty());
        assert_eq!(config.delimiter, "|");
    }

    #[test]
    fn test_unparseable_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[reader\n").unwrap();
        let (config, warnings) = load_config(dir.path());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Config parse error"));
        assert_eq!(config.marker_index, 0);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_file(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_log_dir_is_under_app_dir() {
        let paths = PlatformPaths {
            config_dir: PathBuf::from("cfg"),
            data_local_dir: PathBuf::from("data"),
        };
        assert_eq!(
            paths.log_dir("NINA"),
            PathBuf::from("data").join("NINA").join("Logs")
        );
    }
}
