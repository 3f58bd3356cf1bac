//! Host-filesystem metadata helpers shared by `add` and `extract`.

use std::fs;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default mode used when `preserve_mode` is false, or on platforms with no
/// POSIX permission bits.
pub(super) const DEFAULT_FILE_MODE: u32 = 0o644;
pub(super) const DEFAULT_DIR_MODE: u32 = 0o755;

#[cfg(unix)]
pub(super) fn mode_of(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
pub(super) fn mode_of(meta: &fs::Metadata) -> u32 {
    if meta.is_dir() {
        DEFAULT_DIR_MODE
    } else {
        DEFAULT_FILE_MODE
    }
}

/// Split a [`fs::Metadata`] modification time into `(seconds, nanos)` since
/// the UNIX epoch, defaulting to the epoch itself if the platform can't
/// report one.
pub(super) fn mtime_of(meta: &fs::Metadata) -> (i64, u32) {
    match meta.modified() {
        Ok(t) => match t.duration_since(UNIX_EPOCH) {
            Ok(d) => (d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => (-(e.duration().as_secs() as i64), 0),
        },
        Err(_) => (0, 0),
    }
}

/// Inverse of [`mtime_of`]: rebuild a [`SystemTime`] from stored seconds/nanos.
pub(super) fn system_time_from(secs: i64, nanos: u32) -> SystemTime {
    if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs as u64, nanos)
    } else {
        UNIX_EPOCH - Duration::new((-secs) as u64, 0)
    }
}
