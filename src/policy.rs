//! Protected-root policy.
//! One central answer to "does touching this path need administrator
//! privileges", so escalation decisions never drift between operations.

use std::path::{Path, PathBuf};

use crate::exec::Elevation;

/// Roots whose subtrees force privilege escalation for writes.
pub const DEFAULT_PROTECTED_ROOTS: [&str; 3] = ["/Applications", "/Library", "/System"];

#[derive(Debug, Clone)]
pub struct ProtectedRootPolicy {
    roots: Vec<PathBuf>,
}

impl Default for ProtectedRootPolicy {
    fn default() -> Self {
        ProtectedRootPolicy::new(DEFAULT_PROTECTED_ROOTS.iter().map(PathBuf::from))
    }
}

impl ProtectedRootPolicy {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        ProtectedRootPolicy {
            roots: roots.into_iter().collect(),
        }
    }

    /// A policy under which nothing escalates. Tests run against scratch
    /// directories with this.
    pub fn none() -> Self {
        ProtectedRootPolicy { roots: Vec::new() }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Component-wise prefix check: `/Library/Fonts` is protected,
    /// `/LibraryAnnex` is not. The user's own `~/Library` is untouched by
    /// this; only absolute roots are listed.
    pub fn is_protected(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(root))
    }

    pub fn elevation_for(&self, path: &Path) -> Elevation {
        if self.is_protected(path) {
            Elevation::Admin
        } else {
            Elevation::None
        }
    }
}
