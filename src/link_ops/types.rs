//! Engine data model: link definitions, probed states, conflict
//! classification results and operation outcomes.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One managed link definition, as stored in the link store.
///
/// `from` is the original location and may start with `~`; `to` is the slot
/// under the backup root. Both empty strings mean "not configured yet".
/// `defaults` is an optional shell command run after a successful install,
/// typically a `defaults write` telling the app about its relocated data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub name: String,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<String>,
}

impl LinkSpec {
    pub fn new(
        name: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        LinkSpec {
            name: name.into(),
            from: from.into(),
            to: to.into(),
            defaults: None,
        }
    }

    pub fn with_defaults(mut self, command: impl Into<String>) -> Self {
        self.defaults = Some(command.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.from.trim().is_empty() && !self.to.trim().is_empty()
    }
}

/// Absolute source and backup paths for one operation. Recomputed on every
/// call; the backup root or home directory may differ between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub source: PathBuf,
    pub backup: PathBuf,
}

/// Probed filesystem state of one absolute path.
///
/// `exists` reflects `test -e`, which follows symlinks and answers false
/// for paths this process cannot read. A dangling symlink therefore shows
/// up as `exists: false, is_symlink: true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathState {
    pub exists: bool,
    pub is_symlink: bool,
    pub is_dir: bool,
}

/// What the probed (source, backup) pair means for an install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictCase {
    /// Content already sits in the slot and nothing occupies the source.
    NoAction,
    /// Real content at the source, free slot. Relocate it.
    DirectRelocate,
    /// Real content on both sides. Someone has to choose.
    UserConflict,
    /// Slot is populated; only the link at the source is missing or stale.
    CreateLinkOnly,
    /// Neither side exists. Link creation is still attempted and dangles
    /// until the backup appears.
    SourceAndBackupMissing,
}

impl fmt::Display for ConflictCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            ConflictCase::NoAction => "no-action",
            ConflictCase::DirectRelocate => "direct-relocate",
            ConflictCase::UserConflict => "user-conflict",
            ConflictCase::CreateLinkOnly => "create-link-only",
            ConflictCase::SourceAndBackupMissing => "both-missing",
        };
        f.write_str(word)
    }
}

/// Caller decision for a [`ConflictCase::UserConflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictChoice {
    /// The source wins; the backup slot is archived first.
    KeepSource,
    /// The backup wins; the source is archived, then linked over.
    KeepBackup,
}

/// Both sides of a surfaced conflict, enough for a caller to prompt with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConflict {
    pub name: String,
    pub source: PathBuf,
    pub backup: PathBuf,
    pub source_is_dir: bool,
    pub backup_is_dir: bool,
}

/// Result of one install or resolve call.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// The operation ran to completion. False for a pending conflict or a
    /// failed post-install verification.
    pub success: bool,
    /// The final symlink was probed and points at the backup.
    pub verified: bool,
    pub message: String,
    /// Present when the caller must decide a conflict and call resolve.
    pub pending: Option<PendingConflict>,
    /// Slot-relative name of the archival copy made while resolving a
    /// conflict, when one was made.
    pub archived: Option<String>,
}

impl InstallOutcome {
    pub(crate) fn done(verified: bool, message: String, archived: Option<String>) -> Self {
        InstallOutcome {
            success: true,
            verified,
            message,
            pending: None,
            archived,
        }
    }

    pub(crate) fn unverified(message: String, archived: Option<String>) -> Self {
        InstallOutcome {
            success: false,
            verified: false,
            message,
            pending: None,
            archived,
        }
    }

    pub(crate) fn pending(conflict: PendingConflict, message: String) -> Self {
        InstallOutcome {
            success: false,
            verified: false,
            message,
            pending: Some(conflict),
            archived: None,
        }
    }

    pub fn needs_decision(&self) -> bool {
        self.pending.is_some()
    }
}

/// Result of one uninstall call. Uninstall removes the link and nothing
/// else; the backup stays where it is, and the message says so.
#[derive(Debug, Clone)]
pub struct UninstallOutcome {
    pub success: bool,
    pub message: String,
}

/// Read-only condition of a link, for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Source is a symlink pointing at the populated backup slot.
    Installed,
    /// Source is a symlink pointing somewhere else, or at a missing slot.
    BrokenLink,
    /// Real content on both sides.
    Conflict,
    /// Real content at the source, free slot.
    ReadyToInstall,
    /// Slot populated, nothing at the source.
    BackupOnly,
    /// Neither side exists.
    Missing,
    /// The spec has no usable from/to paths yet.
    Unconfigured,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            LinkStatus::Installed => "installed",
            LinkStatus::BrokenLink => "broken link",
            LinkStatus::Conflict => "conflict",
            LinkStatus::ReadyToInstall => "ready",
            LinkStatus::BackupOnly => "backup only",
            LinkStatus::Missing => "missing",
            LinkStatus::Unconfigured => "unconfigured",
        };
        f.write_str(word)
    }
}
