//! Typed error definitions for linkstash.
//! Every variant carries the resolved paths it needs to print an exact
//! remediation command; nothing here attempts rollback.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error(
        "Filesystem access has not been granted yet (probe: {probe}). \
         Grant this terminal Full Disk Access under System Settings > \
         Privacy & Security > Full Disk Access, then re-run."
    )]
    PermissionDenied { probe: PathBuf },

    #[error("Could not determine the state of '{}': {detail}", path.display())]
    ProbeFailed { path: PathBuf, detail: String },

    #[error(
        "Copy failed: '{}' -> '{}': {output}. Nothing was deleted; both sides are unchanged.",
        src.display(),
        dest.display()
    )]
    CopyFailed {
        src: PathBuf,
        dest: PathBuf,
        output: String,
    },

    #[error("{}", removal_text(path, backup.as_deref(), output))]
    RemoveFailed {
        path: PathBuf,
        /// Where the already-verified copy lives, when one exists.
        backup: Option<PathBuf>,
        output: String,
    },

    #[error("{}", cancellation_text(path, backup.as_deref()))]
    EscalationCancelled {
        path: PathBuf,
        /// Where the already-verified copy lives, when one exists.
        backup: Option<PathBuf>,
    },

    #[error("Could not create the symlink at '{}': {output}", path.display())]
    SymlinkFailed { path: PathBuf, output: String },

    #[error("{}", mismatch_text(path, expected, actual.as_deref()))]
    SymlinkVerificationMismatch {
        path: PathBuf,
        expected: PathBuf,
        actual: Option<PathBuf>,
    },

    #[error(
        "Both the source and the backup of '{name}' hold real content; \
         a keep-source or keep-backup decision is required to continue."
    )]
    UnresolvedConflict { name: String },

    #[error("Link '{name}' is not usable: {detail}")]
    Misconfigured { name: String, detail: String },

    #[error("Operation interrupted by user")]
    Interrupted,

    #[error("Cannot compose an elevated command: {detail}")]
    CommandRender { detail: String },
}

impl LinkError {
    /// Stable machine-readable code for structured logs and tests.
    pub fn code(&self) -> &'static str {
        match self {
            LinkError::PermissionDenied { .. } => "permission_denied",
            LinkError::ProbeFailed { .. } => "probe_failed",
            LinkError::CopyFailed { .. } => "copy_failed",
            LinkError::RemoveFailed { .. } => "remove_failed",
            LinkError::EscalationCancelled { .. } => "escalation_cancelled",
            LinkError::SymlinkFailed { .. } => "symlink_failed",
            LinkError::SymlinkVerificationMismatch { .. } => "symlink_verification_mismatch",
            LinkError::UnresolvedConflict { .. } => "unresolved_conflict",
            LinkError::Misconfigured { .. } => "misconfigured",
            LinkError::Interrupted => "interrupted",
            LinkError::CommandRender { .. } => "command_render",
        }
    }

    /// The literal command a user can run to finish the operation by hand,
    /// when one applies.
    pub fn manual_command(&self) -> Option<String> {
        match self {
            LinkError::RemoveFailed { path, .. } | LinkError::EscalationCancelled { path, .. } => {
                Some(format!("sudo rm -rf {}", quoted(path)))
            }
            _ => None,
        }
    }
}

/// Shell-quote a path for inclusion in user-facing command text.
fn quoted(path: &Path) -> String {
    shell_words::quote(&path.to_string_lossy()).into_owned()
}

fn removal_text(path: &Path, backup: Option<&Path>, output: &str) -> String {
    let mut msg = match backup {
        Some(b) => format!(
            "The backup at '{}' is complete, but removing the original '{}' failed",
            b.display(),
            path.display()
        ),
        None => format!("Removing '{}' failed", path.display()),
    };
    if !output.is_empty() {
        msg.push_str(": ");
        msg.push_str(output);
    }
    msg.push_str(&format!(
        ". Remove it manually with: sudo rm -rf {}",
        quoted(path)
    ));
    msg
}

fn cancellation_text(path: &Path, backup: Option<&Path>) -> String {
    match backup {
        Some(b) => format!(
            "The authorization prompt was cancelled or the credential was incorrect. \
             The backup at '{}' is complete; the original '{}' is still in place. \
             Remove it manually with: sudo rm -rf {}",
            b.display(),
            path.display(),
            quoted(path)
        ),
        None => format!(
            "The authorization prompt was cancelled or the credential was incorrect. \
             '{}' was left untouched.",
            path.display()
        ),
    }
}

fn mismatch_text(source: &Path, expected: &Path, actual: Option<&Path>) -> String {
    match actual {
        Some(a) => format!(
            "'{}' is a symlink to '{}', not to the expected backup '{}'. \
             No retry is attempted; inspect the path manually.",
            source.display(),
            a.display(),
            expected.display()
        ),
        None => format!(
            "'{}' is not a symlink to '{}' after install. \
             No retry is attempted; inspect the path manually.",
            source.display(),
            expected.display()
        ),
    }
}
