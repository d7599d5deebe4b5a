//! Scratch rigs for exercising the engine against disposable directories.
//! Compiled for unit tests and, through the `test-helpers` feature, for
//! integration tests and downstream crates.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::exec::SystemRunner;
use crate::link_ops::{LinkInstaller, LinkSpec, LinkUninstaller, PathProbe, PathResolver};
use crate::policy::ProtectedRootPolicy;

/// A disposable home directory and backup store, plus engine builders
/// pinned to them. The directories live until the rig is dropped.
pub struct Scratch {
    dir: TempDir,
    home: PathBuf,
    store: PathBuf,
}

impl Scratch {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create scratch dir");
        let home = dir.path().join("home");
        let store = dir.path().join("store");
        fs::create_dir_all(&home).expect("create scratch home");
        fs::create_dir_all(&store).expect("create scratch store");
        Scratch { dir, home, store }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn store(&self) -> &Path {
        &self.store
    }

    /// A resolver whose `~` is the scratch home.
    pub fn resolver(&self) -> PathResolver {
        PathResolver::with_home(self.store.clone(), self.home.clone())
    }

    pub fn probe(&self) -> PathProbe {
        PathProbe::new(Arc::new(SystemRunner))
    }

    /// Installer wired to the scratch store, with the disk-access gate and
    /// the protected-root policy switched off so nothing prompts.
    pub fn installer(&self) -> LinkInstaller {
        LinkInstaller::new(Arc::new(SystemRunner), self.resolver())
            .with_policy(ProtectedRootPolicy::none())
            .skip_access_check()
    }

    pub fn uninstaller(&self) -> LinkUninstaller {
        LinkUninstaller::new(Arc::new(SystemRunner), self.resolver())
            .with_policy(ProtectedRootPolicy::none())
            .skip_access_check()
    }

    /// A spec whose source lives under the scratch home.
    pub fn spec(&self, name: &str, rel_from: &str, slot: &str) -> LinkSpec {
        LinkSpec::new(name, format!("~/{rel_from}"), slot)
    }

    /// Write a file under the scratch home, creating parents.
    pub fn seed_file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.home.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parents");
        }
        fs::write(&path, contents).expect("seed file");
        path
    }

    /// Create a directory under the scratch home, with parents.
    pub fn seed_dir(&self, rel: &str) -> PathBuf {
        let path = self.home.join(rel);
        fs::create_dir_all(&path).expect("seed dir");
        path
    }

    /// Write a file under the backup store, creating parents.
    pub fn seed_slot(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.store.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parents");
        }
        fs::write(&path, contents).expect("seed slot");
        path
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Scratch::new()
    }
}
