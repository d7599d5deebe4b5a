//! Filesystem probes through the command boundary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::trace;

use crate::errors::LinkError;
use crate::exec::{CommandLine, CommandRunner, Elevation};
use crate::link_ops::types::PathState;

/// Probes path state by spawning `test` and `readlink` rather than calling
/// metadata APIs, so protected locations answer exactly the way the
/// mutation commands will see them.
///
/// `test -e` follows symlinks and exits nonzero both for missing paths and
/// for paths this process cannot read; decision logic downstream relies on
/// that deliberate simplification. Each flag is probed at most once per
/// call.
#[derive(Clone)]
pub struct PathProbe {
    runner: Arc<dyn CommandRunner>,
}

impl PathProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        PathProbe { runner }
    }

    pub fn probe(&self, path: &Path) -> Result<PathState, LinkError> {
        let exists = self.check("-e", path)?;
        let is_symlink = self.check("-L", path)?;
        let is_dir = if exists { self.check("-d", path)? } else { false };
        let state = PathState {
            exists,
            is_symlink,
            is_dir,
        };
        trace!(path = %path.display(), ?state, "probed");
        Ok(state)
    }

    fn check(&self, flag: &str, path: &Path) -> Result<bool, LinkError> {
        let cmd = CommandLine::new("test").arg(flag).arg_path(path);
        let out = self.runner.run(&cmd, Elevation::None)?;
        // `test` answers through its exit status alone; any stderr means the
        // probe infrastructure itself broke.
        if out.failed() && !out.stderr.trim().is_empty() {
            return Err(LinkError::ProbeFailed {
                path: path.to_path_buf(),
                detail: out.stderr.trim().to_owned(),
            });
        }
        Ok(out.success)
    }

    /// Target stored in a symlink, when readable.
    pub fn read_target(&self, path: &Path) -> Result<Option<PathBuf>, LinkError> {
        let cmd = CommandLine::new("readlink").arg_path(path);
        let out = self.runner.run(&cmd, Elevation::None)?;
        if out.failed() {
            return Ok(None);
        }
        let target = out.stdout.trim();
        if target.is_empty() {
            Ok(None)
        } else {
            Ok(Some(PathBuf::from(target)))
        }
    }
}
