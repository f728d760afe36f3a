//! Shared error model, configuration, and build layout for webscratch.
//!
//! This crate is the foundation depended on by the pipeline and the CLI.
//! It provides:
//! - [`WebscratchError`] — the unified error type
//! - [`BuildLayout`] — every path the build reads or writes, resolved once
//! - Configuration ([`ProjectConfig`], config loading)

pub mod config;
pub mod error;
pub mod layout;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ArchivesConfig, CONFIG_FILE_NAME, EngineConfig, ProjectConfig, RecodeConfig, init_config,
    load_config, load_config_from,
};
pub use error::{Result, WebscratchError};
pub use layout::{BuildLayout, DEFAULT_ARCHIVES};
