//! Backup-phase mutations: parent creation, content-aware copy with
//! verification, and verified removal with a single escalation retry.
//!
//! Ordering is the safety contract here. A copy is probed before anything
//! is deleted, and a failed or cancelled removal leaves both sides on disk,
//! so the worst outcome is a duplicate.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::errors::LinkError;
use crate::exec::{CommandLine, CommandRunner, Elevation};
use crate::link_ops::probe::PathProbe;
use crate::platform;
use crate::policy::ProtectedRootPolicy;

pub(crate) fn remove_cmd(path: &Path) -> CommandLine {
    CommandLine::new("rm").arg("-rf").arg_path(path)
}

pub(crate) fn mkdir_cmd(dir: &Path) -> CommandLine {
    CommandLine::new("mkdir").arg("-p").arg_path(dir)
}

pub(crate) fn symlink_cmd(target: &Path, link: &Path) -> CommandLine {
    CommandLine::new("ln").arg("-s").arg_path(target).arg_path(link)
}

/// Shared handles for one backup phase.
pub(crate) struct BackupCtx<'a> {
    pub runner: &'a dyn CommandRunner,
    pub probe: &'a PathProbe,
    pub policy: &'a ProtectedRootPolicy,
}

impl BackupCtx<'_> {
    /// Create the slot's parent directory, escalated only when the parent
    /// itself sits under a protected root.
    pub fn ensure_parent(&self, src: &Path, dest: &Path) -> Result<(), LinkError> {
        let Some(parent) = dest.parent() else {
            return Ok(());
        };
        let out = self
            .runner
            .run(&mkdir_cmd(parent), self.policy.elevation_for(parent))?;
        if out.cancelled() {
            return Err(LinkError::EscalationCancelled {
                path: parent.to_path_buf(),
                backup: None,
            });
        }
        if out.failed() {
            return Err(LinkError::CopyFailed {
                src: src.to_path_buf(),
                dest: dest.to_path_buf(),
                output: format!("could not create '{}': {}", parent.display(), out.combined()),
            });
        }
        Ok(())
    }

    /// Copy `src` to `dest` with the platform's content-aware tool, then
    /// probe that `dest` actually appeared. Nothing is deleted here.
    pub fn copy_verified(&self, src: &Path, dest: &Path) -> Result<(), LinkError> {
        let cmd = platform::copy_command(src, dest);
        let out = self.runner.run(&cmd, self.policy.elevation_for(dest))?;
        if out.cancelled() {
            return Err(LinkError::EscalationCancelled {
                path: dest.to_path_buf(),
                backup: None,
            });
        }
        // Some copy tools exit zero after partial failures but say "error"
        // on a stream, so both signals count.
        let combined = out.combined();
        if out.failed() || combined.to_lowercase().contains("error") {
            return Err(LinkError::CopyFailed {
                src: src.to_path_buf(),
                dest: dest.to_path_buf(),
                output: combined,
            });
        }
        let state = self.probe.probe(dest)?;
        if !state.exists {
            return Err(LinkError::CopyFailed {
                src: src.to_path_buf(),
                dest: dest.to_path_buf(),
                output: "copy reported success but the destination did not appear".to_owned(),
            });
        }
        self.advisory_entry_count(src, dest);
        info!(src = %src.display(), dest = %dest.display(), "copied");
        Ok(())
    }

    /// Advisory only: compare entry counts when both trees are readable by
    /// this process. Protected trees skip silently.
    fn advisory_entry_count(&self, src: &Path, dest: &Path) {
        fn count(root: &Path) -> Option<usize> {
            if !root.is_dir() {
                return None;
            }
            let mut n = 0usize;
            for entry in walkdir::WalkDir::new(root).follow_links(false) {
                match entry {
                    Ok(_) => n += 1,
                    Err(_) => return None,
                }
            }
            Some(n)
        }
        if let (Some(a), Some(b)) = (count(src), count(dest))
            && a != b
        {
            warn!(
                src = %src.display(),
                dest = %dest.display(),
                src_entries = a,
                dest_entries = b,
                "entry counts differ after copy"
            );
        }
    }

    /// Remove `path` and probe that it is gone. An unelevated removal that
    /// leaves the path behind is retried once with administrator
    /// privileges. `backup` is the already-verified copy, named in every
    /// failure so the user can finish by hand.
    pub fn remove_verified(&self, path: &Path, backup: &Path) -> Result<(), LinkError> {
        let elevation = self.policy.elevation_for(path);
        let out = self.runner.run(&remove_cmd(path), elevation)?;
        if out.cancelled() {
            return Err(LinkError::EscalationCancelled {
                path: path.to_path_buf(),
                backup: Some(backup.to_path_buf()),
            });
        }
        let mut last_output = out.combined();
        let mut state = self.probe.probe(path)?;
        if (state.exists || state.is_symlink) && elevation == Elevation::None {
            debug!(path = %path.display(), "unelevated removal left the path behind, retrying as admin");
            let retry = self.runner.run(&remove_cmd(path), Elevation::Admin)?;
            if retry.cancelled() {
                return Err(LinkError::EscalationCancelled {
                    path: path.to_path_buf(),
                    backup: Some(backup.to_path_buf()),
                });
            }
            last_output = retry.combined();
            state = self.probe.probe(path)?;
        }
        if state.exists || state.is_symlink {
            return Err(LinkError::RemoveFailed {
                path: path.to_path_buf(),
                backup: Some(backup.to_path_buf()),
                output: last_output,
            });
        }
        info!(path = %path.display(), "removed");
        Ok(())
    }

    /// Clear a stale entry (typically a leftover symlink) with no backup
    /// framing and no retry.
    pub fn remove_entry(&self, path: &Path) -> Result<(), LinkError> {
        let out = self
            .runner
            .run(&remove_cmd(path), self.policy.elevation_for(path))?;
        if out.cancelled() {
            return Err(LinkError::EscalationCancelled {
                path: path.to_path_buf(),
                backup: None,
            });
        }
        let state = self.probe.probe(path)?;
        if state.exists || state.is_symlink {
            return Err(LinkError::RemoveFailed {
                path: path.to_path_buf(),
                backup: None,
                output: out.combined(),
            });
        }
        Ok(())
    }
}
