//! Unix (non-macOS) implementations of the per-OS command shapes.

use std::path::{Path, PathBuf};

use crate::exec::CommandLine;

/// Output markers for a refused or abandoned sudo prompt. Matched
/// case-insensitively against combined output.
pub const AUTH_CANCEL_MARKERS: [&str; 3] = [
    "incorrect password",
    "a password is required",
    "not in the sudoers",
];

/// No TCC equivalent here; POSIX modes are the whole story and the probes
/// themselves surface those.
pub fn check_disk_access(_home: &Path) -> Result<(), PathBuf> {
    Ok(())
}

/// Archive-mode copy keeping modes, times and symlinks intact. `dest` never
/// exists beforehand, so `cp -a` creates it as a full replica of `src`.
pub fn copy_command(src: &Path, dest: &Path) -> CommandLine {
    CommandLine::new("cp").arg("-a").arg_path(src).arg_path(dest)
}

/// Wrap an already-rendered shell line for administrator execution. The
/// line was quoted once by [`CommandLine::render`]; passing it as a single
/// argv element to `sh -c` adds no further quoting layer.
pub fn elevated_invocation(shell_line: &str) -> CommandLine {
    CommandLine::new("sudo").arg("sh").arg("-c").arg(shell_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cp_preserves_with_archive_flag() {
        let cmd = copy_command(Path::new("/data/src"), Path::new("/data/dest"));
        assert_eq!(cmd.render().unwrap(), "cp -a /data/src /data/dest");
    }

    #[test]
    fn sudo_wraps_line_as_single_argument() {
        let cmd = elevated_invocation("rm -rf '/opt/some dir'");
        assert_eq!(cmd.program(), "sudo");
        assert_eq!(cmd.args().len(), 3);
        assert_eq!(cmd.args()[2].to_string_lossy(), "rm -rf '/opt/some dir'");
    }

    #[test]
    fn disk_access_always_granted() {
        assert!(check_disk_access(Path::new("/home/dave")).is_ok());
    }
}
