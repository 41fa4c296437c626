// LogPane - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors keep their causal chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level error type for all LogPane operations.
#[derive(Debug)]
pub enum LogPaneError {
    /// Reading a log file failed.
    Read(ReadError),

    /// Locating the log directory or active log file failed.
    Locate(LocateError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for LogPaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(e) => write!(f, "Read error: {e}"),
            Self::Locate(e) => write!(f, "Locate error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for LogPaneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read(e) => Some(e),
            Self::Locate(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Read errors
// ---------------------------------------------------------------------------

/// Diagnostic causes attached to non-OK read outcomes.
#[derive(Debug)]
pub enum ReadError {
    /// The path did not exist when the load started.
    NotFound { path: PathBuf },

    /// Another process holds a lock incompatible with a shared read.
    Locked { path: PathBuf, source: io::Error },

    /// The read budget ran out before the end of the file.
    Cancelled { path: PathBuf, after: Duration },

    /// Any other I/O fault while opening or reading.
    Io { path: PathBuf, source: io::Error },
}

impl ReadError {
    /// Path the failed read was aimed at.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::NotFound { path }
            | Self::Locked { path, .. }
            | Self::Cancelled { path, .. }
            | Self::Io { path, .. } => path,
        }
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "'{}' does not exist", path.display())
            }
            Self::Locked { path, source } => write!(
                f,
                "'{}' is locked by another process: {source}",
                path.display()
            ),
            Self::Cancelled { path, after } => write!(
                f,
                "reading '{}' was cancelled after {:.1}s",
                path.display(),
                after.as_secs_f64()
            ),
            Self::Io { path, source } => {
                write!(f, "'{}': I/O error: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Locked { source, .. } | Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ReadError> for LogPaneError {
    fn from(e: ReadError) -> Self {
        Self::Read(e)
    }
}

// ---------------------------------------------------------------------------
// Locate errors
// ---------------------------------------------------------------------------

/// Errors related to finding log files on disk.
#[derive(Debug)]
pub enum LocateError {
    /// The log directory does not exist or is not a directory.
    DirectoryNotFound { path: PathBuf },

    /// Listing the directory failed.
    Traversal {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// The active-log pattern could not be compiled.
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryNotFound { path } => {
                write!(f, "Log directory '{}' does not exist", path.display())
            }
            Self::Traversal { path, source } => {
                write!(f, "Error listing '{}': {source}", path.display())
            }
            Self::InvalidPattern { pattern, source } => {
                write!(f, "Invalid log file pattern '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for LocateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Traversal { source, .. } => Some(source),
            Self::InvalidPattern { source, .. } => Some(source),
            Self::DirectoryNotFound { .. } => None,
        }
    }
}

impl From<LocateError> for LogPaneError {
    fn from(e: LocateError) -> Self {
        Self::Locate(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LogPaneError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for LogPane results.
pub type Result<T> = std::result::Result<T, LogPaneError>;
