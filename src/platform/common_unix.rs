//! Helpers shared by every Unix target: the user-record home lookup and
//! secure creation of config and log files.

use anyhow::{Context, Result, bail};
use std::ffi::{CStr, OsStr};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::utils::path_has_symlink_ancestor;

/// Real home directory from the passwd record, not `$HOME`.
/// A sandboxed or su'd parent process can rewrite `$HOME`; the user record
/// stays authoritative, so paths resolve identically either way.
pub fn real_home() -> Option<PathBuf> {
    // SAFETY: getpwuid hands back a pointer into static libc storage; the
    // directory field is copied out before any further libc call.
    unsafe {
        let pw = libc::getpwuid(libc::getuid());
        if pw.is_null() {
            return None;
        }
        let dir = (*pw).pw_dir;
        if dir.is_null() {
            return None;
        }
        let bytes = CStr::from_ptr(dir).to_bytes();
        if bytes.is_empty() {
            None
        } else {
            Some(PathBuf::from(OsStr::from_bytes(bytes)))
        }
    }
}

/// Create `dir` (and parents) with mode 0700, tightening it if it already
/// exists with group or world access.
pub fn ensure_secure_directory(dir: &Path) -> Result<()> {
    if path_has_symlink_ancestor(dir) {
        bail!(
            "refusing to use directory with symlinked ancestor: {}",
            dir.display()
        );
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
    let mode = fs::metadata(dir)?.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .with_context(|| format!("failed to tighten mode on '{}'", dir.display()))?;
    }
    Ok(())
}

/// Open a log file for appending. A fresh file is created 0600; an existing
/// file keeps whatever mode the user gave it.
pub fn open_log_file_secure_append(path: &Path) -> Result<File> {
    if path_has_symlink_ancestor(path) {
        bail!(
            "refusing to log through a symlinked ancestor: {}",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        ensure_secure_directory(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("failed to open log file '{}'", path.display()))
}

/// Write `contents` to `path` atomically with mode 0600: exclusive temp
/// sibling, fsync, rename, parent directory fsync. Readers never observe a
/// partial file.
pub fn atomic_write_0600(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path has no parent: {}", path.display()))?;
    if path_has_symlink_ancestor(path) {
        bail!(
            "refusing to write through a symlinked ancestor: {}",
            path.display()
        );
    }
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create parent '{}'", parent.display()))?;

    let tmp = parent.join(format!(".linkstash.tmp.{}", std::process::id()));
    let written = (|| -> Result<()> {
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .mode(0o600)
            .open(&tmp)
            .with_context(|| format!("failed to create temp file '{}'", tmp.display()))?;
        file.write_all(contents).context("write temp file")?;
        file.sync_all().context("fsync temp file")?;
        Ok(())
    })();
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err).with_context(|| {
            format!("failed to move '{}' into place", path.display())
        });
    }

    let dir = File::open(parent)
        .with_context(|| format!("failed to open parent '{}'", parent.display()))?;
    dir.sync_all().context("fsync parent directory")?;
    Ok(())
}
