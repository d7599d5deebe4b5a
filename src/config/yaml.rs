//! YAML config loading and template creation.
//! Unknown keys are rejected so typos fail loudly instead of silently
//! falling back to defaults.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::paths::{default_backup_root, default_config_path, default_log_path};
use super::types::{Config, ConflictPolicy, LogLevel};
use crate::platform;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    backup_root: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    log_json: Option<bool>,
    on_conflict: Option<String>,
}

/// Result of [`load_or_init`].
pub enum LoadResult {
    Loaded(Config),
    /// No config existed; a commented template was written here and the
    /// defaults are in effect.
    CreatedTemplate(PathBuf, Config),
}

/// Load the config at the default (or env-overridden) location, writing a
/// fresh template when none exists yet. An env override pointing at a
/// missing file is an error; an explicitly named config should exist.
pub fn load_or_init() -> Result<LoadResult> {
    let path = default_config_path()?;
    if path.exists() {
        return Ok(LoadResult::Loaded(load_config_from_path(&path)?));
    }
    if std::env::var(super::paths::CONFIG_ENV).is_ok_and(|v| !v.trim().is_empty()) {
        bail!(
            "LINKSTASH_CONFIG points at '{}', which does not exist",
            path.display()
        );
    }
    create_template_config(&path)?;
    Ok(LoadResult::CreatedTemplate(path, Config::default()))
}

/// Parse one YAML config file into a full [`Config`].
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    let raw: RawConfig = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse config '{}'", path.display()))?;
    debug!(path = %path.display(), "config loaded");

    let log_level = match raw.log_level.as_deref() {
        None => LogLevel::default(),
        Some(s) => LogLevel::parse(s)
            .with_context(|| format!("invalid log_level '{s}' in '{}'", path.display()))?,
    };
    let on_conflict = match raw.on_conflict.as_deref() {
        None => ConflictPolicy::default(),
        Some(s) => ConflictPolicy::parse(s)
            .with_context(|| format!("invalid on_conflict '{s}' in '{}'", path.display()))?,
    };
    // An explicitly empty log_file disables file logging; an absent key
    // picks the default next to the config.
    let log_file = match raw.log_file.as_deref().map(str::trim) {
        None => default_log_path().ok(),
        Some("") => None,
        Some(p) => Some(PathBuf::from(p)),
    };
    let backup_root = match raw.backup_root.as_deref().map(str::trim) {
        None | Some("") => default_backup_root(),
        Some(p) => PathBuf::from(p),
    };

    Ok(Config {
        backup_root,
        log_level,
        log_file,
        log_json: raw.log_json.unwrap_or(false),
        dry_run: false,
        on_conflict,
    })
}

/// Write a commented template (0600, atomic) reflecting the defaults.
pub fn create_template_config(path: &Path) -> Result<()> {
    let backup_root = default_backup_root();
    let log_file = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let template = format!(
        "\
# linkstash configuration
#
# backup_root  directory that receives relocated content and holds links.yaml
# log_level    quiet | normal | info | debug
# log_file     log destination; leave empty to disable file logging
# log_json     true emits logs as JSON lines
# on_conflict  ask | keep-source | keep-backup

backup_root: \"{}\"
log_level: normal
log_file: \"{}\"
log_json: false
on_conflict: ask
",
        backup_root.display(),
        log_file,
    );
    platform::atomic_write_0600(path, template.as_bytes())
        .with_context(|| format!("failed to write config template '{}'", path.display()))?;
    debug!(path = %path.display(), "config template created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, text: &str) {
        fs::write(path, text).unwrap();
    }

    #[test]
    fn full_config_parses() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        write(
            &path,
            "backup_root: \"/backups/store\"\nlog_level: debug\nlog_file: \"/tmp/ls.log\"\nlog_json: true\non_conflict: keep-backup\n",
        );
        let cfg = load_config_from_path(&path).unwrap();
        assert_eq!(cfg.backup_root, PathBuf::from("/backups/store"));
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/ls.log")));
        assert!(cfg.log_json);
        assert_eq!(cfg.on_conflict, ConflictPolicy::KeepBackup);
    }

    #[test]
    fn empty_log_file_disables_file_logging() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        write(&path, "backup_root: \"/b\"\nlog_file: \"\"\n");
        let cfg = load_config_from_path(&path).unwrap();
        assert_eq!(cfg.log_file, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        write(&path, "backup_root: \"/b\"\nbackup_roott: \"/typo\"\n");
        let err = load_config_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"), "{err:#}");
    }

    #[test]
    fn bad_log_level_is_an_error_not_a_default() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        write(&path, "log_level: loud\n");
        assert!(load_config_from_path(&path).is_err());
    }

    #[test]
    fn template_is_loadable_and_private() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        create_template_config(&path).unwrap();
        let cfg = load_config_from_path(&path).unwrap();
        assert_eq!(cfg.log_level, LogLevel::Normal);
        assert_eq!(cfg.on_conflict, ConflictPolicy::Ask);
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
