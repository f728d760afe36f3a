//! Error types for webscratch.
//!
//! Library crates use [`WebscratchError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Top-level error type for all webscratch operations.
#[derive(Debug, thiserror::Error)]
pub enum WebscratchError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A vendor archive could not be read or contains an unsafe entry.
    #[error("archive error in {path:?}: {message}")]
    Archive { path: PathBuf, message: String },

    /// The script engine could not be started at all.
    #[error("failed to start engine `{program}`: {source}")]
    EngineSpawn {
        program: String,
        source: std::io::Error,
    },

    /// The script engine ran but exited unsuccessfully.
    #[error("{step} failed: engine exited with {status}")]
    EngineFailed { step: String, status: ExitStatus },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WebscratchError>;

impl WebscratchError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an archive error for the archive at `path`.
    pub fn archive(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Archive {
            path: path.into(),
            message: msg.into(),
        }
    }
}
