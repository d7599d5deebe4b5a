//! CLI definition and parsing.
//! Defines Args, the subcommand tree and the override plumbing onto Config.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - Global flags may appear before or after the subcommand.

use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, ConflictPolicy, LogLevel};
use crate::link_ops::ConflictChoice;

/// CLI wrapper for the linkstash library.
/// CLI flags override config values loaded from the YAML config file.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Relocate app data into a backup store and leave a symlink behind",
    arg_required_else_help = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Use this config file instead of the default (also settable via
    /// LINKSTASH_CONFIG).
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Override the backup root directory for this invocation.
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub backup_root: Option<PathBuf>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        global = true,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Only log errors (equivalent to `--log-level quiet`).
    #[arg(short = 'q', long, global = true, conflicts_with = "debug")]
    pub quiet: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, global = true, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Standing answer for both-sides-real conflicts: ask, keep-source or
    /// keep-backup.
    #[arg(long, global = true, value_name = "POLICY")]
    pub on_conflict: Option<ConflictPolicy>,

    /// Write logs to this file in addition to stdout.
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, global = true, help = "Emit logs in structured JSON")]
    pub json: bool,

    /// Dry-run: log actions but do not modify the filesystem.
    #[arg(
        long,
        global = true,
        help = "Show what would be done, but do not modify files/directories"
    )]
    pub dry_run: bool,

    /// Print where linkstash will look for the config file (or LINKSTASH_CONFIG if set), then exit.
    #[arg(
        long,
        global = true,
        help = "Print the config file location used by linkstash and exit"
    )]
    pub print_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Back up the source of each named link and replace it with a symlink.
    Install {
        /// Link names as stored in links.yaml.
        names: Vec<String>,

        /// Install every configured link.
        #[arg(long)]
        all: bool,

        /// Resolve a both-sides-real conflict without prompting.
        #[arg(long, value_enum)]
        keep: Option<KeepSide>,
    },

    /// Remove the symlink at a link's source path. The backup stays put.
    Uninstall {
        /// Link names as stored in links.yaml.
        names: Vec<String>,

        /// Uninstall every configured link.
        #[arg(long)]
        all: bool,
    },

    /// Show the state of configured links.
    Status {
        /// Limit to these link names (default: all).
        names: Vec<String>,

        /// Also print the resolved source and backup paths.
        #[arg(long)]
        paths: bool,
    },

    /// Add a link definition to the store.
    Add {
        /// Display name for the link.
        name: String,

        /// Original location; may start with `~`.
        #[arg(long, value_hint = ValueHint::AnyPath)]
        from: String,

        /// Slot under the backup root (default: the file name of --from).
        #[arg(long)]
        to: Option<String>,

        /// Shell command to run after a successful install.
        #[arg(long)]
        defaults: Option<String>,
    },

    /// Remove a link definition from the store. Never touches the filesystem.
    Remove {
        /// Name of the definition to drop.
        name: String,
    },

    /// List bundled recipes, or apply one.
    Recipes {
        /// Add the named app recipe's links to the store.
        #[arg(long, value_name = "APP")]
        apply: Option<String>,

        /// Run the named OS recipe's defaults command.
        #[arg(long, value_name = "RECIPE")]
        tweak: Option<String>,
    },

    /// Create the config and link store templates and print their locations.
    Init,
}

/// CLI spelling of a conflict decision.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepSide {
    Source,
    Backup,
}

impl KeepSide {
    pub fn choice(self) -> ConflictChoice {
        match self {
            KeepSide::Source => ConflictChoice::KeepSource,
            KeepSide::Backup => ConflictChoice::KeepBackup,
        }
    }
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --quiet > --log-level value > None (use config
    /// default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        if self.quiet {
            return Some(LogLevel::Quiet);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset
    /// flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(root) = &self.backup_root {
            cfg.backup_root = root.clone();
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(file) = &self.log_file {
            cfg.log_file = Some(file.clone());
        }
        if self.json {
            cfg.log_json = true;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
        if let Some(policy) = self.on_conflict {
            cfg.on_conflict = policy;
        }
        // Per-command --keep is more specific than --on-conflict.
        if let Some(Command::Install {
            keep: Some(side), ..
        }) = &self.command
        {
            cfg.on_conflict = match side {
                KeepSide::Source => ConflictPolicy::KeepSource,
                KeepSide::Backup => ConflictPolicy::KeepBackup,
            };
        }
    }
}

/// Trim quotes and one trailing separator from a pasted path. Users drag
/// paths out of Finder or paste shell-quoted strings; both forms should
/// just work.
pub fn sanitize_path(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut inner = if (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        || (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
    {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    };
    if inner.ends_with('/') && inner.len() > 1 {
        inner.pop();
    }
    inner
}

pub fn parse() -> Args {
    Args::parse()
}
