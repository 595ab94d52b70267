//! CLI error type.

use std::io;

use repoupgrade::{ConfigError, UpgradeError};
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The repository document could not be converted.
    #[error("{0}")]
    Upgrade(#[from] UpgradeError),

    /// Failed to read an input file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to write an output file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Configuration or usage problem.
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code: 1 when the document was rejected, 2 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Upgrade(_) => 1,
            _ => 2,
        }
    }
}
