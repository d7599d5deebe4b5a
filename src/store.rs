//! The link store: `links.yaml` under the backup root.
//!
//! Keeping definitions inside the store means the one directory a user
//! backs up carries both the content and the instructions to re-link it on
//! a fresh machine. Saves take an advisory lock on a sibling lock file and
//! write atomically, so concurrent invocations cannot shred the document.

use anyhow::{Context, Result, bail};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::link_ops::LinkSpec;
use crate::platform;

pub const STORE_FILE_NAME: &str = "links.yaml";
const LOCK_FILE_NAME: &str = ".links.yaml.lock";

const STORE_TEMPLATE: &str = "\
# linkstash link definitions
#
# Each entry relocates `from` into the backup store at `to` and leaves a
# symlink behind. `defaults` is an optional shell command run after a
# successful install. Example:
#
# links:
#   - name: Fonts
#     from: \"~/Library/Fonts\"
#     to: Fonts
#   - name: Audio Plug-Ins
#     from: \"~/Library/Audio/Plug-Ins\"
#     to: AudioPlugins
links: []
";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDoc {
    #[serde(default)]
    links: Vec<LinkSpec>,
}

#[derive(Debug)]
pub struct LinkStore {
    path: PathBuf,
    links: Vec<LinkSpec>,
}

impl LinkStore {
    pub fn store_path(backup_root: &Path) -> PathBuf {
        backup_root.join(STORE_FILE_NAME)
    }

    /// Load the store for a backup root, writing a commented empty template
    /// on first use.
    pub fn load(backup_root: &Path) -> Result<Self> {
        let path = Self::store_path(backup_root);
        if !path.exists() {
            fs::create_dir_all(backup_root).with_context(|| {
                format!("failed to create backup root '{}'", backup_root.display())
            })?;
            platform::atomic_write_0600(&path, STORE_TEMPLATE.as_bytes())
                .with_context(|| format!("failed to create '{}'", path.display()))?;
            info!(path = %path.display(), "created link store template");
            return Ok(LinkStore {
                path,
                links: Vec::new(),
            });
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        let doc: StoreDoc = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse '{}'", path.display()))?;
        debug!(path = %path.display(), links = doc.links.len(), "link store loaded");
        Ok(LinkStore {
            path,
            links: doc.links,
        })
    }

    pub fn save(&self) -> Result<()> {
        let _lock = self.lock()?;
        let doc = StoreDoc {
            links: self.links.clone(),
        };
        let text = serde_yaml::to_string(&doc).context("failed to serialize link store")?;
        platform::atomic_write_0600(&self.path, text.as_bytes())
            .with_context(|| format!("failed to write '{}'", self.path.display()))?;
        debug!(path = %self.path.display(), links = self.links.len(), "link store saved");
        Ok(())
    }

    fn lock(&self) -> Result<File> {
        let dir = self
            .path
            .parent()
            .with_context(|| format!("store path has no parent: {}", self.path.display()))?;
        let lock_path = dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file '{}'", lock_path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("failed to lock '{}'", lock_path.display()))?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn links(&self) -> &[LinkSpec] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Option<&LinkSpec> {
        self.links
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Add a spec, adjusting its name with a ` (n)` suffix when the name is
    /// already taken. Returns the name actually stored.
    pub fn add(&mut self, mut spec: LinkSpec) -> String {
        spec.name = self.unique_name(&spec.name);
        let stored = spec.name.clone();
        self.links.push(spec);
        stored
    }

    pub fn remove(&mut self, name: &str) -> Result<LinkSpec> {
        let idx = self
            .links
            .iter()
            .position(|l| l.name.eq_ignore_ascii_case(name));
        match idx {
            Some(i) => Ok(self.links.remove(i)),
            None => bail!("no link named '{name}' in {}", self.path.display()),
        }
    }

    fn unique_name(&self, base: &str) -> String {
        if self.find(base).is_none() {
            return base.to_owned();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{base} ({n})");
            if self.find(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_load_writes_an_empty_template() {
        let tmp = tempdir().unwrap();
        let store = LinkStore::load(tmp.path()).unwrap();
        assert!(store.is_empty());
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("links: []"));
        // The commented examples parse if un-commented, but load as empty.
        let again = LinkStore::load(tmp.path()).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn add_save_load_round_trip() {
        let tmp = tempdir().unwrap();
        let mut store = LinkStore::load(tmp.path()).unwrap();
        store.add(LinkSpec::new("Fonts", "~/Library/Fonts", "Fonts"));
        store.add(
            LinkSpec::new("Dock", "~/Library/Preferences/com.apple.dock.plist", "Dock")
                .with_defaults("killall Dock"),
        );
        store.save().unwrap();

        let loaded = LinkStore::load(tmp.path()).unwrap();
        assert_eq!(loaded.links().len(), 2);
        let dock = loaded.find("dock").unwrap();
        assert_eq!(dock.defaults.as_deref(), Some("killall Dock"));
    }

    #[test]
    fn duplicate_names_get_numbered() {
        let tmp = tempdir().unwrap();
        let mut store = LinkStore::load(tmp.path()).unwrap();
        assert_eq!(store.add(LinkSpec::new("Fonts", "~/a", "a")), "Fonts");
        assert_eq!(store.add(LinkSpec::new("Fonts", "~/b", "b")), "Fonts (2)");
        assert_eq!(store.add(LinkSpec::new("fonts", "~/c", "c")), "fonts (3)");
    }

    #[test]
    fn remove_unknown_name_is_an_error() {
        let tmp = tempdir().unwrap();
        let mut store = LinkStore::load(tmp.path()).unwrap();
        store.add(LinkSpec::new("Fonts", "~/a", "a"));
        assert!(store.remove("nope").is_err());
        let removed = store.remove("FONTS").unwrap();
        assert_eq!(removed.name, "Fonts");
        assert!(store.is_empty());
    }

    #[test]
    fn save_leaves_no_partial_file_visible() {
        let tmp = tempdir().unwrap();
        let mut store = LinkStore::load(tmp.path()).unwrap();
        for i in 0..50 {
            store.add(LinkSpec::new(format!("L{i}"), format!("~/s{i}"), format!("d{i}")));
        }
        store.save().unwrap();
        let loaded = LinkStore::load(tmp.path()).unwrap();
        assert_eq!(loaded.links().len(), 50);
    }
}
