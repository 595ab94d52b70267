//! Release classification.
//!
//! Decides whether a source release can be expressed as a tag-based or
//! branch-based release of a GitHub/BitBucket repository, or has to keep its
//! literal download URL. Classification never fails: anything unrecognized
//! becomes [`ReleaseKind::Explicit`].
//!
//! # Legacy releases
//!
//! A legacy release is a `{version, url}` pair. The URL is normalized, then
//! matched against [`DOWNLOAD_RULES`](crate::hosts::DOWNLOAD_RULES):
//!
//! | Shape                          | Requires semver | Result   | Advisory           |
//! |--------------------------------|-----------------|----------|--------------------|
//! | tag archive, same version      | yes             | `Tags`   | GitHub, if `1.2`   |
//! | tag archive, other numeric tag | yes             | `Tags`   | always             |
//! | branch archive                 | no              | `Branch` | always             |
//! | anything else                  | -               | explicit | -                  |
//!
//! # Schema 2.0 releases
//!
//! A 2.0 release carries a browsable `details` URL, matched against
//! [`BROWSE_RULES`](crate::hosts::BROWSE_RULES) instead.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::advisory::AdvisoryState;
use crate::config::UpgradeOptions;
use crate::hosts::{
    browse_match, download_matches, is_numeric_tag, normalize_download_url, BrowseShape,
    DownloadShape, Host,
};
use crate::model::ReleaseKind;

/// Append `.0` to a `MAJOR.MINOR` version.
pub fn fixed_version(version: &str) -> String {
    static MAJOR_MINOR: OnceLock<Regex> = OnceLock::new();
    let pattern = MAJOR_MINOR.get_or_init(|| Regex::new(r"^\d+\.\d+$").unwrap());
    if pattern.is_match(version) {
        format!("{}.0", version)
    } else {
        version.to_string()
    }
}

/// True for exactly `MAJOR.MINOR.PATCH`.
pub fn is_semver(version: &str) -> bool {
    static SEMVER: OnceLock<Regex> = OnceLock::new();
    SEMVER
        .get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+$").unwrap())
        .is_match(version)
}

/// Classify a legacy `{version, url}` release.
///
/// `date` is only used when the release stays explicit. Returned tag and
/// branch kinds always carry the full repository `base`.
pub fn classify_download(
    url: &str,
    version: &str,
    date: &str,
    advisory: &mut AdvisoryState,
) -> ReleaseKind {
    let url = normalize_download_url(url);
    let fixed = fixed_version(version);
    let semver = is_semver(&fixed);

    for found in download_matches(&url) {
        let host = found.rule.host;
        let reference = found.reference.as_deref().unwrap_or_default();
        let base = host.base_url(&found.repo);

        match found.rule.shape {
            DownloadShape::TagArchive { allows_mismatch } => {
                if !semver {
                    continue;
                }
                let exact = reference == version || reference.strip_prefix('v') == Some(version);
                let mismatch = !exact && allows_mismatch && is_numeric_tag(reference);
                if !exact && !mismatch {
                    continue;
                }

                // BitBucket tags that match the version already exist as-is
                let needs_tag = mismatch || (host == Host::GitHub && fixed != version);
                if needs_tag {
                    advisory.add_instruction(host.create_tag_instruction(&found.repo, &fixed));
                }

                debug!(url = %url, version, host = host.name(), needs_tag, "Classified tag release");
                return ReleaseKind::Tags { base: Some(base) };
            }
            DownloadShape::BranchArchive => {
                advisory.add_instruction(host.create_tag_instruction(&found.repo, &fixed));

                debug!(url = %url, version, host = host.name(), branch = reference, "Classified branch release");
                return ReleaseKind::Branch {
                    base: Some(base),
                    branch: reference.to_string(),
                };
            }
        }
    }

    debug!(url = %url, version, "Keeping explicit release");
    advisory.mark_explicit_release();
    ReleaseKind::Explicit {
        version: version.to_string(),
        url,
        date: date.to_string(),
    }
}

/// Classify a schema 2.0 release record.
pub fn classify_browse(
    release: &Map<String, Value>,
    options: &UpgradeOptions,
    advisory: &mut AdvisoryState,
) -> ReleaseKind {
    let details = release.get("details").and_then(Value::as_str);

    if let Some(found) = details.and_then(browse_match) {
        let base = Some(found.rule.host.base_url(&found.repo));
        let kind = match found.rule.shape {
            BrowseShape::Repository { default_branch } => ReleaseKind::Branch {
                base,
                branch: default_branch.to_string(),
            },
            BrowseShape::Tree => ReleaseKind::Branch {
                base,
                branch: found.reference.unwrap_or_default(),
            },
            BrowseShape::Tags => ReleaseKind::Tags { base },
        };
        debug!(details = ?details, kind = %kind, "Classified 2.0 release");
        return kind;
    }

    let text = |key: &str| release.get(key).and_then(Value::as_str).map(str::to_string);

    advisory.mark_explicit_release();
    ReleaseKind::Explicit {
        version: text("version").unwrap_or_else(|| options.default_version.clone()),
        url: text("url")
            .or_else(|| details.map(str::to_string))
            .unwrap_or_default(),
        date: text("date").unwrap_or_else(|| options.default_date.clone()),
    }
}
