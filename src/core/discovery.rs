// LogPane - core/discovery.rs
//
// Finding the log file to open inside a log directory.
//
// Two heuristics, both best effort:
//   - the *active* log file: the one the running application is writing,
//     recognised by a name that embeds the application version and pid;
//   - the *latest* log file: the most recently modified `*.log`.
//
// Reads only directory listings and file metadata, never file contents.

use crate::util::constants;
use crate::util::error::LocateError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A file found directly inside the log directory.
#[derive(Debug, Clone)]
pub struct LogFileCandidate {
    pub path: PathBuf,
    pub file_name: String,
    pub modified: Option<SystemTime>,
}

/// Regex matching the active log file name.
///
/// Log files are named `yyyyMMdd-HHmmss-<version>.<pid>-yyyyMM.log`; files
/// written by older releases end in `-yyyyMMdd.log` instead (daily rather
/// than monthly rollover), so the trailing date takes six to eight digits.
pub fn active_log_file_pattern(version: &str, pid: u32) -> Result<Regex, LocateError> {
    let pattern = format!(
        r"^\d{{8}}-\d{{6}}-{}\.{pid}-\d{{6,8}}\.log$",
        regex::escape(version)
    );
    Regex::new(&pattern).map_err(|source| LocateError::InvalidPattern { pattern, source })
}

/// List the regular files directly inside `dir`.
///
/// Unreadable entries are skipped with a debug log; only a missing or
/// unlistable directory is an error.
pub fn list_log_dir(dir: &Path) -> Result<Vec<LogFileCandidate>, LocateError> {
    if !dir.is_dir() {
        return Err(LocateError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    let walker = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false);

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                return Err(LocateError::Traversal {
                    path: dir.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::debug!(path = %entry.path().display(), "Skipping non-UTF-8 filename");
            continue;
        };

        let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
        files.push(LogFileCandidate {
            path: entry.into_path(),
            file_name,
            modified,
        });
    }

    Ok(files)
}

/// Path of the log file the application with `version`/`pid` is writing.
pub fn find_active_log_file(
    dir: &Path,
    version: &str,
    pid: u32,
) -> Result<Option<PathBuf>, LocateError> {
    let re = active_log_file_pattern(version, pid)?;
    let found = list_log_dir(dir)?
        .into_iter()
        .find(|f| re.is_match(&f.file_name))
        .map(|f| f.path);

    if found.is_none() {
        tracing::warn!(
            dir = %dir.display(),
            version,
            pid,
            "Failed to find the active log file"
        );
    }
    Ok(found)
}

/// Path of the most recently modified `*.log` file in `dir`.
///
/// Files whose modification time cannot be read rank below all others;
/// ties are broken by case-insensitive file name, greatest wins.
pub fn latest_log_file(dir: &Path) -> Result<Option<PathBuf>, LocateError> {
    let pattern = match glob::Pattern::new(constants::LOG_FILE_GLOB) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(pattern = constants::LOG_FILE_GLOB, error = %e, "Invalid glob pattern");
            return Ok(None);
        }
    };

    let latest = list_log_dir(dir)?
        .into_iter()
        .filter(|f| pattern.matches(&f.file_name))
        .max_by_key(|f| (f.modified, f.file_name.to_lowercase()))
        .map(|f| f.path);

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, "2025-01-01 00:00:00|INFO|a|b|1|x\n").expect("write fixture");
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        fs::File::options()
            .write(true)
            .open(&path)
            .and_then(|f| f.set_modified(mtime))
            .expect("set mtime");
        path
    }

    #[test]
    fn test_pattern_matches_monthly_and_daily_names() {
        let re = active_log_file_pattern("3.1.2.9001", 4242).unwrap();
        assert!(re.is_match("20250911-201530-3.1.2.9001.4242-202509.log"));
        assert!(re.is_match("20230911-201530-3.1.2.9001.4242-20230911.log"));
    }

    #[test]
    fn test_pattern_rejects_other_process_or_version() {
        let re = active_log_file_pattern("3.1.2.9001", 4242).unwrap();
        assert!(!re.is_match("20250911-201530-3.1.2.9001.4243-202509.log"));
        assert!(!re.is_match("20250911-201530-3.1.2.9002.4242-202509.log"));
        assert!(!re.is_match("20250911-201530-3.1.2.9001.4242-202509.txt"));
        // Version dots are literal.
        assert!(!re.is_match("20250911-201530-3x1x2x9001.4242-202509.log"));
    }

    #[test]
    fn test_find_active_log_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir, "20250910-080000-3.1.2.9001.1111-202509.log", 100);
        let active = touch(&dir, "20250911-201530-3.1.2.9001.4242-202509.log", 50);
        touch(&dir, "notes.txt", 0);

        let found = find_active_log_file(dir.path(), "3.1.2.9001", 4242).unwrap();
        assert_eq!(found, Some(active));
    }

    #[test]
    fn test_find_active_log_file_absent() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir, "20250910-080000-3.1.2.9001.1111-202509.log", 0);
        let found = find_active_log_file(dir.path(), "3.1.2.9001", 4242).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_latest_log_file_by_mtime() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir, "b.log", 300);
        let newest = touch(&dir, "a.log", 10);
        touch(&dir, "z.txt", 0);

        assert_eq!(latest_log_file(dir.path()).unwrap(), Some(newest));
    }

    #[test]
    fn test_latest_log_file_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(latest_log_file(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("Logs");
        assert!(matches!(
            list_log_dir(&missing),
            Err(LocateError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_subdirectories_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("archive.log")).unwrap();
        assert!(list_log_dir(dir.path()).unwrap().is_empty());
    }
}
