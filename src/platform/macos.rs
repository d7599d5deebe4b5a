//! macOS-specific pieces: the Full Disk Access canary, content-aware copies
//! via `ditto` and administrator runs via `osascript`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::exec::CommandLine;

/// Output markers for a cancelled or failed authorization prompt.
/// `-60005` is errAuthorizationCanceled, `(-128)` is the AppleScript user
/// cancel, and "incorrect" covers a rejected credential. Matched
/// case-insensitively against combined output.
pub const AUTH_CANCEL_MARKERS: [&str; 3] = ["-60005", "(-128)", "incorrect"];

/// Path whose readability proves the Full Disk Access grant. Safari's
/// container is TCC-protected, so listing it fails for any process without
/// the grant regardless of POSIX modes.
pub fn disk_access_canary(home: &Path) -> PathBuf {
    home.join("Library").join("Safari")
}

/// Ok when this process can reach TCC-protected data; Err carries the
/// canary path that was probed.
pub fn check_disk_access(home: &Path) -> Result<(), PathBuf> {
    let canary = disk_access_canary(home);
    if fs::read_dir(&canary).is_ok() {
        Ok(())
    } else {
        Err(canary)
    }
}

/// Content-aware copy keeping resource forks, extended attributes and modes
/// intact. For directories `ditto` creates `dest` as a full replica of
/// `src`.
pub fn copy_command(src: &Path, dest: &Path) -> CommandLine {
    CommandLine::new("ditto").arg_path(src).arg_path(dest)
}

/// Wrap an already-rendered shell line for administrator execution.
/// The AppleScript string escape below is the only second layer ever
/// applied; the line itself was quoted once by [`CommandLine::render`].
pub fn elevated_invocation(shell_line: &str) -> CommandLine {
    let script = format!(
        "do shell script \"{}\" with administrator privileges",
        applescript_quote(shell_line)
    );
    CommandLine::new("osascript").arg("-e").arg(script)
}

fn applescript_quote(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
