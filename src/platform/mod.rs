//! Platform-specific helpers.
//! Hides OS differences behind a uniform API: the user-record home lookup,
//! secure config and log file creation, the Full Disk Access check and the
//! per-OS command shapes for copies and elevated runs.

mod common_unix;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(not(target_os = "macos"))]
mod unix;

pub use common_unix::{
    atomic_write_0600, ensure_secure_directory, open_log_file_secure_append, real_home,
};

#[cfg(target_os = "macos")]
pub use macos::{AUTH_CANCEL_MARKERS, check_disk_access, copy_command, elevated_invocation};

#[cfg(not(target_os = "macos"))]
pub use unix::{AUTH_CANCEL_MARKERS, check_disk_access, copy_command, elevated_invocation};
