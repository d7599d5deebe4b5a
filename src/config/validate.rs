//! Config validation and normalization.
//! Expands the backup root, creates it when missing, and proves it is a
//! writable directory before any engine work starts.

use anyhow::{Context, Result, bail};
use std::fs;
use tracing::{debug, info};

use crate::link_ops::resolve::expand_home_in;
use crate::platform;
use crate::utils::is_writable_probe;

use super::types::Config;

impl Config {
    /// Expand and verify the backup root in place. Called once at startup,
    /// after CLI overrides are applied.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        let home = platform::real_home()
            .or_else(dirs::home_dir)
            .context("no home directory available")?;
        let root_text = self.backup_root.to_string_lossy().into_owned();
        let mut root = expand_home_in(&root_text, &home);
        if root.is_relative() {
            bail!(
                "backup_root must be absolute or start with '~': '{}'",
                root.display()
            );
        }

        if root.exists() {
            if !root.is_dir() {
                bail!("backup_root is not a directory: '{}'", root.display());
            }
        } else {
            fs::create_dir_all(&root)
                .with_context(|| format!("failed to create backup_root '{}'", root.display()))?;
            info!(root = %root.display(), "created backup root");
        }

        is_writable_probe(&root)
            .with_context(|| format!("backup_root '{}' is not writable", root.display()))?;

        // Canonicalize so containment guards compare real paths.
        root = fs::canonicalize(&root).unwrap_or(root);
        debug!(root = %root.display(), "backup root validated");
        self.backup_root = root;
        Ok(())
    }
}
