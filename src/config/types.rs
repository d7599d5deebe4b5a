//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel and ConflictPolicy parse the same strings the config file and
//!   CLI use.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use crate::link_ops::ConflictChoice;

/// Program-defined verbosity levels exposed to users and the config file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Standing answer for both-sides-real conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Surface the conflict and wait for an explicit decision (default).
    #[default]
    Ask,
    KeepSource,
    KeepBackup,
}

impl ConflictPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ask" | "prompt" => Some(ConflictPolicy::Ask),
            "keep-source" | "source" => Some(ConflictPolicy::KeepSource),
            "keep-backup" | "backup" => Some(ConflictPolicy::KeepBackup),
            _ => None,
        }
    }

    /// The decision this policy pre-supplies, if any.
    pub fn choice(self) -> Option<ConflictChoice> {
        match self {
            ConflictPolicy::Ask => None,
            ConflictPolicy::KeepSource => Some(ConflictChoice::KeepSource),
            ConflictPolicy::KeepBackup => Some(ConflictChoice::KeepBackup),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictPolicy::Ask => "ask",
            ConflictPolicy::KeepSource => "keep-source",
            ConflictPolicy::KeepBackup => "keep-backup",
        };
        f.write_str(s)
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid conflict policy: '{s}'"))
    }
}

/// Runtime configuration for the link engine and CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding relocated content and the link store.
    pub backup_root: PathBuf,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
    /// Print actions but do not modify the filesystem.
    pub dry_run: bool,
    /// Standing conflict answer; Ask surfaces conflicts to the caller.
    pub on_conflict: ConflictPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backup_root: paths::default_backup_root(),
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path().ok(),
            log_json: false,
            dry_run: false,
            on_conflict: ConflictPolicy::default(),
        }
    }
}

impl Config {
    /// Config rooted at an explicit store directory; other fields default.
    pub fn with_backup_root(backup_root: impl Into<PathBuf>) -> Self {
        Config {
            backup_root: backup_root.into(),
            ..Config::default()
        }
    }
}
