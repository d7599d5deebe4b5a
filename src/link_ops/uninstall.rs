//! Uninstall: remove whatever sits at the source path.
//!
//! Deliberately asymmetric with install. Nothing is restored from the
//! backup; the slot keeps the content and the outcome message says where it
//! lives. Users who want the content back can copy it by hand or re-run
//! install later.

use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::LinkError;
use crate::exec::CommandRunner;
use crate::link_ops::backup::remove_cmd;
use crate::link_ops::probe::PathProbe;
use crate::link_ops::resolve::PathResolver;
use crate::link_ops::types::{LinkSpec, UninstallOutcome};
use crate::platform;
use crate::policy::ProtectedRootPolicy;
use crate::shutdown;

pub struct LinkUninstaller {
    runner: Arc<dyn CommandRunner>,
    probe: PathProbe,
    resolver: PathResolver,
    policy: ProtectedRootPolicy,
    dry_run: bool,
    check_disk_access: bool,
}

impl LinkUninstaller {
    pub fn new(runner: Arc<dyn CommandRunner>, resolver: PathResolver) -> Self {
        let probe = PathProbe::new(runner.clone());
        LinkUninstaller {
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

    pub fn skip_access_check(mut self) -> Self {
        self.check_disk_access = false;
        self
    }

    pub fn uninstall(&self, spec: &LinkSpec) -> Result<UninstallOutcome, LinkError> {
        if spec.from.trim().is_empty() {
            return Err(LinkError::Misconfigured {
                name: spec.name.clone(),
                detail: "no source path configured".to_owned(),
            });
        }
        if self.check_disk_access
            && let Err(canary) = platform::check_disk_access(self.resolver.home())
        {
            return Err(LinkError::PermissionDenied { probe: canary });
        }
        if shutdown::is_requested() {
            return Err(LinkError::Interrupted);
        }

        let source = self.resolver.expand_home(&spec.from);
        let backup_note = if spec.to.trim().is_empty() {
            None
        } else {
            Some(self.resolver.slot_path(&spec.to))
        };

        let state = self.probe.probe(&source)?;
        if !state.exists && !state.is_symlink {
            debug!(link = %spec.name, src = %source.display(), "nothing to remove");
            return Ok(UninstallOutcome {
                success: true,
                message: format!("Nothing at '{}'; already uninstalled.", source.display()),
            });
        }

        if self.dry_run {
            return Ok(UninstallOutcome {
                success: true,
                message: format!("dry run: would remove '{}'", source.display()),
            });
        }

        let out = self
            .runner
            .run(&remove_cmd(&source), self.policy.elevation_for(&source))?;
        if out.cancelled() {
            return Err(LinkError::EscalationCancelled {
                path: source,
                backup: None,
            });
        }
        let after = self.probe.probe(&source)?;
        if after.exists || after.is_symlink {
            return Err(LinkError::RemoveFailed {
                path: source,
                backup: backup_note,
                output: out.combined(),
            });
        }

        let mut message = format!("Removed '{}'.", source.display());
        if let Some(backup) = &backup_note {
            message.push_str(&format!(
                " The backup remains at '{}'; uninstall never restores it.",
                backup.display()
            ));
        }
        info!(link = %spec.name, src = %source.display(), "uninstalled");
        Ok(UninstallOutcome {
            success: true,
            message,
        })
    }
}
