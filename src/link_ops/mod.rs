//! The link engine.
//!
//! Submodules mirror the operation pipeline: [`resolve`] turns a spec into
//! absolute paths, [`probe`] reads filesystem state through spawned
//! commands, [`conflict`] classifies the pair, [`backup`] does the
//! copy-then-delete work, [`install`] and [`uninstall`] orchestrate, and
//! [`status`] reports without mutating.

pub mod backup;
pub mod conflict;
pub mod install;
pub mod post;
pub mod probe;
pub mod resolve;
pub mod status;
pub mod types;
pub mod uninstall;

pub use conflict::{archival_name, classify};
pub use install::LinkInstaller;
pub use post::{PostOutcome, run_post_action};
pub use probe::PathProbe;
pub use resolve::PathResolver;
pub use status::link_status;
pub use types::{
    ConflictCase, ConflictChoice, InstallOutcome, LinkSpec, LinkStatus, PathState,
    PendingConflict, ResolvedPaths, UninstallOutcome,
};
pub use uninstall::LinkUninstaller;
