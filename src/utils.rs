//! Small shared helpers.

use std::fs;
use std::path::Path;

/// Quick writable probe: create and remove a small file in `dir`.
/// Uses create_new to avoid clobbering existing files.
pub(crate) fn is_writable_probe(dir: &Path) -> std::io::Result<()> {
    let probe = dir.join(format!(".linkstash_probe_{}.tmp", std::process::id()));
    match fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&probe)
    {
        Ok(_) => {
            let _ = fs::remove_file(&probe);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// True if any existing ancestor of `path` is a symlink. Unreadable
/// ancestors are skipped; this is a refusal heuristic, not an oracle.
pub(crate) fn path_has_symlink_ancestor(path: &Path) -> bool {
    let mut current = path.parent();
    while let Some(ancestor) = current {
        if let Ok(meta) = fs::symlink_metadata(ancestor)
            && meta.file_type().is_symlink()
        {
            return true;
        }
        current = ancestor.parent();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writable_probe_cleans_up() {
        let td = tempdir().unwrap();
        is_writable_probe(td.path()).unwrap();
        assert_eq!(fs::read_dir(td.path()).unwrap().count(), 0);
    }

    #[test]
    fn writable_probe_fails_on_missing_dir() {
        let td = tempdir().unwrap();
        assert!(is_writable_probe(&td.path().join("absent")).is_err());
    }

    #[test]
    fn symlink_ancestor_is_detected() {
        let td = tempdir().unwrap();
        let real = td.path().join("real");
        fs::create_dir(&real).unwrap();
        let alias = td.path().join("alias");
        std::os::unix::fs::symlink(&real, &alias).unwrap();
        assert!(path_has_symlink_ancestor(&alias.join("file")));
        assert!(!path_has_symlink_ancestor(&real.join("file")));
    }
}
