//! Read-only status reporting for listings. Never mutates anything.

use crate::errors::LinkError;
use crate::link_ops::conflict::classify;
use crate::link_ops::probe::PathProbe;
use crate::link_ops::resolve::PathResolver;
use crate::link_ops::types::{ConflictCase, LinkSpec, LinkStatus, ResolvedPaths};

/// Probe both sides of a spec and fold the states into a display status.
pub fn link_status(
    probe: &PathProbe,
    resolver: &PathResolver,
    spec: &LinkSpec,
) -> Result<(LinkStatus, ResolvedPaths), LinkError> {
    let paths = resolver.resolve(spec);
    if !spec.is_configured() {
        return Ok((LinkStatus::Unconfigured, paths));
    }
    let from = probe.probe(&paths.source)?;
    let to = probe.probe(&paths.backup)?;

    if from.is_symlink {
        let target = probe.read_target(&paths.source)?;
        let status = if target.as_deref() == Some(paths.backup.as_path()) && to.exists {
            LinkStatus::Installed
        } else {
            LinkStatus::BrokenLink
        };
        return Ok((status, paths));
    }

    let status = match classify(from, to) {
        ConflictCase::UserConflict => LinkStatus::Conflict,
        ConflictCase::DirectRelocate => LinkStatus::ReadyToInstall,
        ConflictCase::CreateLinkOnly => LinkStatus::BackupOnly,
        ConflictCase::SourceAndBackupMissing => LinkStatus::Missing,
        ConflictCase::NoAction => LinkStatus::BackupOnly,
    };
    Ok((status, paths))
}
