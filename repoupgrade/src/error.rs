//! Error types for repository upgrades.
//!
//! Every error is detected while reading the document, before any package is
//! transformed. Release classification itself never fails: URLs that match no
//! known host shape fall back to explicit releases.

use thiserror::Error;

/// Result type for upgrade operations.
pub type UpgradeResult<T> = Result<T, UpgradeError>;

/// Errors that prevent a repository document from being upgraded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpgradeError {
    /// The text is not a JSON object.
    #[error("The contents do not appear to be valid JSON: {0}")]
    MalformedInput(String),

    /// The document has no `schema_version` key.
    #[error(
        "The JSON does not have a \"schema_version\" key, and thus does not appear to be a repository file."
    )]
    MissingVersion,

    /// The declared schema version is not one this tool understands.
    #[error("The JSON declares schema_version \"{0}\", which is not a known repository schema.")]
    UnsupportedVersion(String),

    /// The declared version is newer than the requested target.
    #[error("The JSON uses schema_version {from}, which cannot be converted down to {to}.")]
    UnsupportedConversion { from: String, to: String },

    /// The document has no package collection.
    #[error(
        "The JSON does not have a \"packages\" key, and thus does not appear to be a repository file."
    )]
    MissingPackages,
}

/// Errors from loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse the INI file.
    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    /// Failed to write the INI file.
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A key or value is not valid.
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    /// Unknown `section.key` name.
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}
