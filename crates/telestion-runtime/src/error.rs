//! Runtime error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while starting a service.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The configuration could not be assembled or bound.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The data directory could not be resolved to an absolute path.
    #[error("Failed to resolve data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A message body could not be encoded or decoded.
    #[error("Failed to encode or decode JSON message: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
