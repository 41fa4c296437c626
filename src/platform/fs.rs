// LogPane - platform/fs.rs
//
// Filesystem helpers for reading log files that another process is still
// writing.

use std::fs::File;
use std::io;
use std::path::Path;

/// Windows share flags: FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE.
#[cfg(windows)]
const SHARE_READ_WRITE_DELETE: u32 = 0x1 | 0x2 | 0x4;

/// Windows ERROR_SHARING_VIOLATION.
#[cfg(windows)]
const ERROR_SHARING_VIOLATION: i32 = 32;

/// Windows ERROR_LOCK_VIOLATION.
#[cfg(windows)]
const ERROR_LOCK_VIOLATION: i32 = 33;

/// EBUSY on Linux and macOS.
#[cfg(unix)]
const EBUSY: i32 = 16;

/// Open `path` read-only without denying other processes read, write or
/// delete access, so the writer keeps logging while we read.
///
/// On Unix files are never share-locked by `open`, so this is a plain open.
pub fn open_shared_read(path: &Path) -> io::Result<File> {
    let mut options = File::options();
    options.read(true);

    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        options.share_mode(SHARE_READ_WRITE_DELETE);
    }

    options.open(path)
}

/// True when `err` means another process holds a lock that is incompatible
/// with our shared read.
pub fn is_lock_violation(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }

    #[cfg(windows)]
    {
        if matches!(
            err.raw_os_error(),
            Some(ERROR_SHARING_VIOLATION) | Some(ERROR_LOCK_VIOLATION)
        ) {
            return true;
        }
    }

    #[cfg(unix)]
    {
        if err.raw_os_error() == Some(EBUSY) {
            return true;
        }
    }

    false
}
