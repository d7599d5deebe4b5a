//! Core library for `linkstash`.
//!
//! Relocates files and directories into a backup store and leaves symlinks
//! at the original locations, so one synced directory carries the content
//! for many scattered paths. The engine reaches the filesystem through
//! spawned shell commands; on protected roots the same command line runs
//! once more under an admin prompt instead of a second code path.
//!
//! The CLI lives in [`app`] and [`cli`]; library consumers build on
//! [`LinkInstaller`], [`LinkUninstaller`], [`LinkStore`] and the probe and
//! resolver types re-exported below.

#[cfg(not(unix))]
compile_error!("linkstash drives Unix shell tooling (test, ln, rm); non-Unix targets are unsupported");

pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod link_ops;
pub mod logging;
pub mod output;
pub mod platform;
pub mod policy;
pub mod recipes;
pub mod shutdown;
pub mod store;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testkit;
mod utils;

pub use config::{Config, ConflictPolicy, LogLevel, default_backup_root, default_config_path};
pub use errors::LinkError;
pub use exec::{CommandLine, CommandRunner, Elevation, ExecOutput, SystemRunner};
#[cfg(any(test, feature = "test-helpers"))]
pub use exec::ScriptedRunner;
pub use link_ops::{
    ConflictCase, ConflictChoice, InstallOutcome, LinkInstaller, LinkSpec, LinkStatus,
    LinkUninstaller, PathProbe, PathResolver, PendingConflict, ResolvedPaths, UninstallOutcome,
    link_status,
};
pub use policy::ProtectedRootPolicy;
pub use store::LinkStore;
