//! Project configuration for webscratch.
//!
//! An optional `webscratch.toml` lives at the project root.
//! CLI flags override environment values, which override the config file,
//! which overrides defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WebscratchError};
use crate::layout::DEFAULT_ARCHIVES;

/// Project configuration file name.
pub const CONFIG_FILE_NAME: &str = "webscratch.toml";

// ---------------------------------------------------------------------------
// Config structs (matching webscratch.toml schema)
// ---------------------------------------------------------------------------

/// Top-level project config, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Vendor archives to unpack.
    #[serde(default)]
    pub archives: ArchivesConfig,

    /// External script engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Encoding normalizer settings.
    #[serde(default)]
    pub recode: RecodeConfig,
}

/// `[archives]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivesConfig {
    /// Archive file names under `original-sources/`, extracted in order.
    #[serde(default = "default_archive_names")]
    pub names: Vec<String>,
}

impl Default for ArchivesConfig {
    fn default() -> Self {
        Self {
            names: default_archive_names(),
        }
    }
}

fn default_archive_names() -> Vec<String> {
    DEFAULT_ARCHIVES.iter().map(|s| s.to_string()).collect()
}

/// `[engine]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Name of the env var holding the engine command line.
    #[serde(default = "default_env_var")]
    pub env_var: String,

    /// Self-test script, run from `js/tests`.
    #[serde(default = "default_self_test")]
    pub self_test: String,

    /// Compiler entry script, run from `js`.
    #[serde(default = "default_compiler")]
    pub compiler: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            env_var: default_env_var(),
            self_test: default_self_test(),
            compiler: default_compiler(),
        }
    }
}

fn default_env_var() -> String {
    "JS".into()
}
fn default_self_test() -> String {
    "handmade-test.js".into()
}
fn default_compiler() -> String {
    "main.js".into()
}

/// `[recode]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecodeConfig {
    /// Rewrite CR and CRLF line endings to LF while recoding.
    #[serde(default)]
    pub unix_newlines: bool,
}

impl ProjectConfig {
    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.engine.env_var.trim().is_empty() {
            return Err(WebscratchError::config("engine.env_var must not be empty"));
        }
        if self.engine.self_test.trim().is_empty() || self.engine.compiler.trim().is_empty() {
            return Err(WebscratchError::config(
                "engine.self_test and engine.compiler must name a script",
            ));
        }
        if self.archives.names.iter().any(|n| n.trim().is_empty()) {
            return Err(WebscratchError::config("archives.names contains an empty entry"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load `webscratch.toml` from the project root. Returns defaults if the file does not exist.
pub fn load_config(root: &Path) -> Result<ProjectConfig> {
    let path = root.join(CONFIG_FILE_NAME);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(ProjectConfig::default());
    }

    load_config_from(&path)
}

/// Load the project config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| WebscratchError::io(path, e))?;

    let config: ProjectConfig = toml::from_str(&content).map_err(|e| {
        WebscratchError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Write a default `webscratch.toml` into the project root.
/// Returns the path to the created file.
pub fn init_config(root: &Path) -> Result<PathBuf> {
    let path = root.join(CONFIG_FILE_NAME);
    let config = ProjectConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| WebscratchError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| WebscratchError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
