//! Default path helpers.
//! Config location honors the LINKSTASH_CONFIG override; the log file sits
//! next to whatever config file is in use.

use anyhow::{Context, Result};
use dirs::{config_dir, data_dir};
use std::path::PathBuf;

/// Environment override for the config file. May name a file or a
/// directory; a directory gets `config.yaml` appended.
pub const CONFIG_ENV: &str = "LINKSTASH_CONFIG";

const CONFIG_FILE_NAME: &str = "config.yaml";
const LOG_FILE_NAME: &str = "linkstash.log";

/// Config path, honoring `LINKSTASH_CONFIG` over the OS default. Relative
/// override values resolve against the current directory.
pub fn default_config_path() -> Result<PathBuf> {
    if let Ok(raw) = std::env::var(CONFIG_ENV)
        && !raw.trim().is_empty()
    {
        let mut p = PathBuf::from(raw.trim());
        if p.is_relative() {
            p = std::env::current_dir()
                .context("cannot resolve a relative LINKSTASH_CONFIG")?
                .join(p);
        }
        if p.is_dir() {
            p.push(CONFIG_FILE_NAME);
        }
        return Ok(p);
    }
    let base = config_dir()
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .context("no config directory available; set LINKSTASH_CONFIG")?;
    Ok(base.join("linkstash").join(CONFIG_FILE_NAME))
}

/// Log file colocated with the config file, so the env override moves both
/// together.
pub fn default_log_path() -> Result<PathBuf> {
    let config = default_config_path()?;
    let dir = config
        .parent()
        .map(|p| p.to_path_buf())
        .context("config path has no parent directory")?;
    Ok(dir.join(LOG_FILE_NAME))
}

/// Default backup store: the OS data directory. On macOS this lands under
/// `~/Library/Application Support`.
pub fn default_backup_root() -> PathBuf {
    let base = data_dir().or_else(|| {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".local").join("share"))
    });
    match base {
        Some(dir) => dir.join("linkstash").join("store"),
        None => PathBuf::from("/var/tmp/linkstash/store"),
    }
}
