//! Config module: types, default paths, YAML loading and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod yaml;

pub use paths::{CONFIG_ENV, default_backup_root, default_config_path, default_log_path};
pub use types::{Config, ConflictPolicy, LogLevel};
pub use yaml::{LoadResult, create_template_config, load_config_from_path, load_or_init};
