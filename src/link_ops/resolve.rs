//! Path resolution: home-marker expansion and backup-slot joining.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::link_ops::types::{LinkSpec, ResolvedPaths};
use crate::platform;

/// Expand a leading `~` against `home`. Anything else passes through
/// untouched; `~user` forms are not supported.
pub fn expand_home_in(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

/// Resolves link specs to absolute (source, backup) pairs.
///
/// The home directory comes from the OS user record rather than `$HOME`, so
/// resolution gives the same answer inside and outside a sandboxed parent
/// process. Paths are recomputed on every call.
#[derive(Debug, Clone)]
pub struct PathResolver {
    backup_root: PathBuf,
    home: PathBuf,
}

impl PathResolver {
    pub fn new(backup_root: impl Into<PathBuf>) -> Self {
        let home = platform::real_home()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| {
                warn!("no home directory in the user record or environment, using /");
                PathBuf::from("/")
            });
        PathResolver {
            backup_root: backup_root.into(),
            home,
        }
    }

    /// Constructor with a pinned home directory, for tests and callers that
    /// resolve on behalf of another user.
    pub fn with_home(backup_root: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        PathResolver {
            backup_root: backup_root.into(),
            home: home.into(),
        }
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn expand_home(&self, raw: &str) -> PathBuf {
        expand_home_in(raw, &self.home)
    }

    /// Absolute path for a slot name. Slots are normally relative to the
    /// backup root; a `~` or absolute value is honored as-is for users who
    /// keep a slot outside the store.
    pub fn slot_path(&self, slot: &str) -> PathBuf {
        let expanded = self.expand_home(slot);
        if expanded.is_absolute() {
            expanded
        } else {
            self.backup_root.join(expanded)
        }
    }

    pub fn backup_path(&self, spec: &LinkSpec) -> PathBuf {
        self.slot_path(&spec.to)
    }

    pub fn resolve(&self, spec: &LinkSpec) -> ResolvedPaths {
        ResolvedPaths {
            source: self.expand_home(&spec.from),
            backup: self.backup_path(spec),
        }
    }
}
