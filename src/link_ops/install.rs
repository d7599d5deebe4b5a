//! Install orchestration.
//!
//! One install walks: permissions gate, path resolution, probes,
//! classification, optional backup phase, symlink creation, verification,
//! optional post action. A both-sides-real conflict pauses the walk and
//! surfaces in the outcome; the caller re-enters through [`LinkInstaller::resolve`]
//! with a decision, and the fresh probes there keep a stale decision
//! harmless.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::LinkError;
use crate::exec::CommandRunner;
use crate::link_ops::backup::{BackupCtx, symlink_cmd};
use crate::link_ops::conflict::{archival_name, classify, resolution_case};
use crate::link_ops::post;
use crate::link_ops::probe::PathProbe;
use crate::link_ops::resolve::PathResolver;
use crate::link_ops::types::{
    ConflictCase, ConflictChoice, InstallOutcome, LinkSpec, PathState, PendingConflict,
    ResolvedPaths,
};
use crate::platform;
use crate::policy::ProtectedRootPolicy;
use crate::shutdown;

pub struct LinkInstaller {
    runner: Arc<dyn CommandRunner>,
    probe: PathProbe,
    resolver: PathResolver,
    policy: ProtectedRootPolicy,
    dry_run: bool,
    check_disk_access: bool,
}

impl LinkInstaller {
    pub fn new(runner: Arc<dyn CommandRunner>, resolver: PathResolver) -> Self {
        let probe = PathProbe::new(runner.clone());
        LinkInstaller {
            runner,
            probe,
            resolver,
            policy: ProtectedRootPolicy::default(),
            dry_run: false,
            check_disk_access: cfg!(target_os = "macos"),
        }
    }

    pub fn with_policy(mut self, policy: ProtectedRootPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Skip the Full Disk Access gate. Tests against scratch directories
    /// use this; the probes themselves still catch unreadable paths.
    pub fn skip_access_check(mut self) -> Self {
        self.check_disk_access = false;
        self
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Install one link. A both-sides-real conflict returns an outcome with
    /// `pending` set instead of touching anything.
    pub fn install(&self, spec: &LinkSpec) -> Result<InstallOutcome, LinkError> {
        self.run(spec, None)
    }

    /// Re-enter a paused install with a conflict decision. States are
    /// probed fresh; if the conflict has meanwhile evaporated the decision
    /// is ignored and the normal path runs.
    pub fn resolve(
        &self,
        spec: &LinkSpec,
        choice: ConflictChoice,
    ) -> Result<InstallOutcome, LinkError> {
        self.run(spec, Some(choice))
    }

    fn run(
        &self,
        spec: &LinkSpec,
        choice: Option<ConflictChoice>,
    ) -> Result<InstallOutcome, LinkError> {
        ensure_configured(spec)?;
        self.check_permissions()?;
        let paths = self.resolver.resolve(spec);
        self.guard_paths(spec, &paths)?;
        if shutdown::is_requested() {
            return Err(LinkError::Interrupted);
        }

        let from = self.probe.probe(&paths.source)?;
        let to = self.probe.probe(&paths.backup)?;
        let case = classify(from, to);
        debug!(
            link = %spec.name,
            case = %case,
            src = %paths.source.display(),
            backup = %paths.backup.display(),
            "classified"
        );

        if case == ConflictCase::UserConflict && choice.is_none() {
            info!(link = %spec.name, "both sides hold real content, awaiting a decision");
            let conflict = PendingConflict {
                name: spec.name.clone(),
                source: paths.source.clone(),
                backup: paths.backup.clone(),
                source_is_dir: from.is_dir,
                backup_is_dir: to.is_dir,
            };
            let message = format!(
                "Both '{}' and '{}' contain real content; decide which to keep, \
                 then resolve with keep-source or keep-backup.",
                paths.source.display(),
                paths.backup.display()
            );
            return Ok(InstallOutcome::pending(conflict, message));
        }

        if self.dry_run {
            let message = describe_dry_run(&paths, case, choice);
            info!(link = %spec.name, "{message}");
            return Ok(InstallOutcome::done(false, message, None));
        }

        let mut archived = None;
        let (effective, slot) = if case == ConflictCase::UserConflict {
            let Some(decided) = choice else {
                return Err(LinkError::UnresolvedConflict {
                    name: spec.name.clone(),
                });
            };
            archived = Some(self.archive_losing_side(spec, &paths, decided)?);
            // The losing side is gone, so the slot state from above no
            // longer applies.
            (resolution_case(decided), PathState::default())
        } else {
            (case, to)
        };

        if shutdown::is_requested() {
            return Err(LinkError::Interrupted);
        }

        let ctx = self.ctx();
        if effective == ConflictCase::DirectRelocate {
            self.relocate(&ctx, &paths, slot)?;
        }

        self.create_symlink(&ctx, &paths, from)?;

        match self.verify(&paths) {
            Ok(()) => {}
            Err(err @ LinkError::SymlinkVerificationMismatch { .. }) => {
                warn!(code = err.code(), link = %spec.name, "verification failed");
                return Ok(InstallOutcome::unverified(err.to_string(), archived));
            }
            Err(err) => return Err(err),
        }

        let mut message = format!(
            "Installed '{}': '{}' -> '{}'",
            spec.name,
            paths.source.display(),
            paths.backup.display()
        );
        if let Some(rel) = &archived {
            message.push_str(&format!(" (conflicting copy archived as '{rel}')"));
        }
        if case == ConflictCase::SourceAndBackupMissing {
            warn!(link = %spec.name, backup = %paths.backup.display(), "backup slot does not exist yet, link dangles");
            message.push_str("; the backup does not exist yet, so the link dangles until it does");
        }
        if let Some(command) = spec.defaults.as_deref() {
            let outcome = post::run_post_action(self.runner.as_ref(), command)?;
            if !outcome.ok {
                message.push_str(&format!(
                    "; post-install command failed: {}",
                    outcome.output
                ));
            }
        }
        info!(link = %spec.name, src = %paths.source.display(), backup = %paths.backup.display(), "installed");
        Ok(InstallOutcome::done(true, message, archived))
    }

    fn ctx(&self) -> BackupCtx<'_> {
        BackupCtx {
            runner: self.runner.as_ref(),
            probe: &self.probe,
            policy: &self.policy,
        }
    }

    fn check_permissions(&self) -> Result<(), LinkError> {
        if !self.check_disk_access {
            return Ok(());
        }
        match platform::check_disk_access(self.resolver.home()) {
            Ok(()) => Ok(()),
            Err(canary) => Err(LinkError::PermissionDenied { probe: canary }),
        }
    }

    fn guard_paths(&self, spec: &LinkSpec, paths: &ResolvedPaths) -> Result<(), LinkError> {
        let root = self.resolver.backup_root();
        if paths.source.starts_with(root) || root.starts_with(&paths.source) {
            return Err(LinkError::Misconfigured {
                name: spec.name.clone(),
                detail: format!(
                    "source '{}' overlaps the backup root '{}'",
                    paths.source.display(),
                    root.display()
                ),
            });
        }
        if paths.backup.starts_with(&paths.source) || paths.source.starts_with(&paths.backup) {
            return Err(LinkError::Misconfigured {
                name: spec.name.clone(),
                detail: format!(
                    "source '{}' and backup '{}' overlap",
                    paths.source.display(),
                    paths.backup.display()
                ),
            });
        }
        Ok(())
    }

    /// Copy the losing side of a decided conflict to a timestamped sibling
    /// slot, then remove it. Copy is verified before anything is deleted.
    fn archive_losing_side(
        &self,
        spec: &LinkSpec,
        paths: &ResolvedPaths,
        choice: ConflictChoice,
    ) -> Result<String, LinkError> {
        let rel = archival_name(&spec.to);
        let archive = self.resolver.slot_path(&rel);
        let losing = match choice {
            ConflictChoice::KeepSource => &paths.backup,
            ConflictChoice::KeepBackup => &paths.source,
        };
        info!(
            link = %spec.name,
            losing = %losing.display(),
            archive = %archive.display(),
            "archiving the losing side"
        );
        let ctx = self.ctx();
        ctx.ensure_parent(losing, &archive)?;
        ctx.copy_verified(losing, &archive)?;
        ctx.remove_verified(losing, &archive)?;
        Ok(rel)
    }

    /// Copy the source into the slot, then remove the source. A stale
    /// symlink occupying the slot is cleared first.
    fn relocate(
        &self,
        ctx: &BackupCtx<'_>,
        paths: &ResolvedPaths,
        slot: PathState,
    ) -> Result<(), LinkError> {
        if slot.is_symlink {
            debug!(slot = %paths.backup.display(), "clearing stale slot entry");
            ctx.remove_entry(&paths.backup)?;
        }
        ctx.ensure_parent(&paths.source, &paths.backup)?;
        ctx.copy_verified(&paths.source, &paths.backup)?;
        // Interruption between copy and delete leaves a duplicate, never a
        // loss.
        if shutdown::is_requested() {
            return Err(LinkError::Interrupted);
        }
        ctx.remove_verified(&paths.source, &paths.backup)?;
        Ok(())
    }

    fn create_symlink(
        &self,
        ctx: &BackupCtx<'_>,
        paths: &ResolvedPaths,
        from: PathState,
    ) -> Result<(), LinkError> {
        if from.is_symlink {
            debug!(src = %paths.source.display(), "removing stale symlink before recreating");
            ctx.remove_entry(&paths.source)?;
        }
        let cmd = symlink_cmd(&paths.backup, &paths.source);
        let out = self
            .runner
            .run(&cmd, self.policy.elevation_for(&paths.source))?;
        if out.cancelled() {
            return Err(LinkError::EscalationCancelled {
                path: paths.source.clone(),
                backup: None,
            });
        }
        if out.failed() {
            return Err(LinkError::SymlinkFailed {
                path: paths.source.clone(),
                output: out.combined(),
            });
        }
        Ok(())
    }

    /// Probe the final state: the source must be a symlink whose stored
    /// target equals the backup path. A mismatch is reported, never
    /// auto-retried.
    fn verify(&self, paths: &ResolvedPaths) -> Result<(), LinkError> {
        let state = self.probe.probe(&paths.source)?;
        if !state.is_symlink {
            return Err(LinkError::SymlinkVerificationMismatch {
                path: paths.source.clone(),
                expected: paths.backup.clone(),
                actual: None,
            });
        }
        match self.probe.read_target(&paths.source)? {
            Some(target) if target == paths.backup => Ok(()),
            other => Err(LinkError::SymlinkVerificationMismatch {
                path: paths.source.clone(),
                expected: paths.backup.clone(),
                actual: other,
            }),
        }
    }
}

fn ensure_configured(spec: &LinkSpec) -> Result<(), LinkError> {
    if spec.is_configured() {
        Ok(())
    } else {
        Err(LinkError::Misconfigured {
            name: spec.name.clone(),
            detail: "the from and to paths are not both set".to_owned(),
        })
    }
}

fn describe_dry_run(
    paths: &ResolvedPaths,
    case: ConflictCase,
    choice: Option<ConflictChoice>,
) -> String {
    let src = paths.source.display();
    let backup = paths.backup.display();
    match (case, choice) {
        (ConflictCase::DirectRelocate, _) => format!(
            "dry run: would relocate '{src}' into '{backup}' and replace it with a symlink"
        ),
        (ConflictCase::CreateLinkOnly, _) => {
            format!("dry run: would recreate the symlink '{src}' -> '{backup}'")
        }
        (ConflictCase::SourceAndBackupMissing, _) => format!(
            "dry run: would create the symlink '{src}' -> '{backup}' (neither side exists yet)"
        ),
        (ConflictCase::UserConflict, Some(ConflictChoice::KeepSource)) => format!(
            "dry run: would archive the backup at '{backup}', then relocate '{src}' into it"
        ),
        (ConflictCase::UserConflict, Some(ConflictChoice::KeepBackup)) => format!(
            "dry run: would archive '{src}', then link it to the existing backup '{backup}'"
        ),
        (ConflictCase::UserConflict, None) | (ConflictCase::NoAction, _) => {
            format!("dry run: nothing to do for '{src}'")
        }
    }
}
