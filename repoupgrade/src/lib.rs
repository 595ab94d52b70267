//! repoupgrade - Schema upgrades for Package Control repository files
//!
//! Converts a `packages.json` repository document from the legacy `1.x`
//! schema to `2.0`, or from `1.x`/`2.0` to `3.0.0`. Releases that point at
//! GitHub or BitBucket archives are rewritten to tag or branch based
//! releases where possible, and the maintainer gets an advisory listing the
//! tags they still need to create.
//!
//! # Example
//!
//! ```
//! use repoupgrade::{upgrade_repository, Outcome, UpgradeOptions};
//!
//! let text = r#"{"schema_version": "2.0", "packages": [
//!     {"name": "Foo", "details": "https://github.com/bar/foo",
//!      "releases": [{"sublime_text": "*", "details": "https://github.com/bar/foo/tags"}]}
//! ]}"#;
//!
//! match upgrade_repository(text, &UpgradeOptions::default()).unwrap() {
//!     Outcome::Success { document, .. } => assert!(document.contains("\"tags\": true")),
//!     Outcome::Noop(_) => unreachable!(),
//! }
//! ```

pub mod advisory;
pub mod classify;
pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod hosts;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod schema;

use tracing::info;

pub use config::{UpgradeOptions, VersionOrder};
pub use document::{parse_document, summarize, DocumentSummary, Parsed, SourceDocument};
pub use error::{ConfigError, UpgradeError, UpgradeResult};
pub use model::Repository;
pub use schema::{SchemaVersion, TargetSchema};

use advisory::AdvisoryState;
use normalize::normalize_package;

/// Result of a successful upgrade request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The document already uses the target schema.
    Noop(String),
    /// The converted document and an optional maintainer advisory.
    Success {
        document: String,
        advisory: Option<String>,
    },
}

/// Upgrade repository `text` to the schema named in `options`.
pub fn upgrade_repository(text: &str, options: &UpgradeOptions) -> UpgradeResult<Outcome> {
    let source = match parse_document(text, options.target)? {
        Parsed::AlreadyAtTarget(message) => {
            info!(target_schema = %options.target, "Document already at target schema");
            return Ok(Outcome::Noop(message));
        }
        Parsed::Ready(source) => source,
    };

    let (repository, advisory) = convert(&source, options);
    let document = format::render(&repository);

    info!(
        from = %source.version,
        to = %options.target,
        packages = repository.packages.len(),
        releases = repository.packages.iter().map(|p| p.releases.len()).sum::<usize>(),
        instructions = advisory.instructions().len(),
        "Upgraded repository"
    );

    Ok(Outcome::Success {
        document,
        advisory: advisory.compose(&source.version, options.target),
    })
}

/// Convert a parsed document into the in-memory target model.
pub fn convert(source: &SourceDocument, options: &UpgradeOptions) -> (Repository, AdvisoryState) {
    let mut advisory = AdvisoryState::new();
    let packages = source
        .packages
        .iter()
        .map(|record| normalize_package(record, &source.version, options, &mut advisory))
        .collect();

    let repository = Repository {
        schema_version: options.target,
        packages,
    };
    (repository, advisory)
}
