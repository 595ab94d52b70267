//! Package normalization.
//!
//! Reshapes one source package record into a canonical [`Package`]:
//! classifies every release, merges per-platform duplicates and drops
//! metadata that is derivable from the package's `details` URL.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::advisory::AdvisoryState;
use crate::classify::{classify_browse, classify_download};
use crate::config::UpgradeOptions;
use crate::document::PackageRecord;
use crate::hosts::{is_readme_filename, match_repository_homepage, Host, RepositoryHomepage};
use crate::merge::{merge_releases, normalize_release};
use crate::model::{
    Author, KeyOrder, Package, Platforms, Release, ReleaseKind, WILDCARD_PLATFORM,
};
use crate::schema::SchemaVersion;

/// Author used when a package names none.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Placeholder text shipped in the old repository template.
pub const AUTHOR_PLACEHOLDER: &str = "Your name or github username";

/// Convert one package record from the `source` schema.
pub fn normalize_package(
    record: &PackageRecord,
    source: &SchemaVersion,
    options: &UpgradeOptions,
    advisory: &mut AdvisoryState,
) -> Package {
    let mut package = if source.is_legacy() {
        legacy_package(record, options, advisory)
    } else {
        v2_package(record, options, advisory)
    };

    let releases = std::mem::take(&mut package.releases);
    package.releases = merge_releases(releases, options);
    package.releases.iter_mut().for_each(normalize_release);
    package.author = package.author.map(Author::split_names);

    debug!(
        package = %package.name,
        releases = package.releases.len(),
        "Normalized package"
    );
    package
}

fn text(record: &Map<String, Value>, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

fn author_from_value(value: &Value) -> Option<Author> {
    match value {
        Value::String(name) => Some(Author::One(name.clone())),
        Value::Array(names) => Some(Author::Many(
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        )),
        _ => None,
    }
}

/// Legacy packages list releases per platform and only have a homepage.
fn legacy_package(
    record: &PackageRecord,
    options: &UpgradeOptions,
    advisory: &mut AdvisoryState,
) -> Package {
    let mut package = Package {
        name: text(record, "name").unwrap_or_default(),
        ..Default::default()
    };

    let author = match record.get("author").and_then(author_from_value) {
        Some(Author::One(name)) if name == AUTHOR_PLACEHOLDER => {
            Author::One(UNKNOWN_AUTHOR.to_string())
        }
        Some(author) => author,
        None => Author::One(UNKNOWN_AUTHOR.to_string()),
    };
    let homepage = text(record, "homepage").unwrap_or_default();

    match match_repository_homepage(&homepage) {
        Some(repository) => {
            // The owner in the URL already names the author
            let redundant = match &author {
                Author::One(name) => name == &repository.owner || name == UNKNOWN_AUTHOR,
                Author::Many(_) => false,
            };
            if !redundant {
                package.author = Some(author);
            }
            package.details = Some(homepage);
        }
        None => {
            package.description = Some(text(record, "description").unwrap_or_default());
            package.author = Some(author);
            package.homepage = Some(homepage);
        }
    }

    carry_metadata(record, &mut package);

    let date = text(record, "last_modified").unwrap_or_else(|| options.default_date.clone());
    let platforms = record.get("platforms").and_then(Value::as_object);

    for (platform, entries) in platforms.into_iter().flatten() {
        let Some(entries) = entries.as_array() else {
            warn!(package = %package.name, platform = %platform, "Ignoring non-array platform releases");
            continue;
        };

        for entry in entries {
            let Some(entry) = entry.as_object() else {
                warn!(package = %package.name, platform = %platform, "Ignoring non-object release");
                continue;
            };

            let url = text(entry, "url").unwrap_or_default();
            let version = text(entry, "version").unwrap_or_else(|| options.default_version.clone());
            let kind = classify_download(&url, &version, &date, advisory);

            let platforms = (platform != WILDCARD_PLATFORM).then(|| Platforms::single(platform.clone()));
            package.releases.push(
                Release::new(elide_base(kind, package.details.as_deref()))
                    .with_platforms(platforms)
                    .with_sublime_text(options.legacy_sublime_text.clone()),
            );
        }
    }

    package
}

/// Schema 2.0 packages already have canonical metadata and browsable
/// release URLs.
fn v2_package(
    record: &PackageRecord,
    options: &UpgradeOptions,
    advisory: &mut AdvisoryState,
) -> Package {
    let details = text(record, "details").map(|d| d.trim_end_matches('/').to_string());
    let homepage = text(record, "homepage").filter(|h| details.as_ref() != Some(h));

    let mut package = Package {
        name: text(record, "name").unwrap_or_default(),
        description: text(record, "description"),
        author: record.get("author").and_then(author_from_value),
        details,
        homepage,
        key_order: KeyOrder::Browse,
        ..Default::default()
    };

    carry_metadata(record, &mut package);

    match record.get("releases") {
        Some(Value::Array(entries)) => {
            for entry in entries {
                let Some(entry) = entry.as_object() else {
                    warn!(package = %package.name, "Ignoring non-object release");
                    continue;
                };
                let kind = classify_browse(entry, options, advisory);
                package.releases.push(Release {
                    platforms: entry.get("platforms").and_then(Platforms::from_value),
                    sublime_text: text(entry, "sublime_text"),
                    kind: elide_base(kind, package.details.as_deref()),
                });
            }
        }
        Some(_) => {
            warn!(package = %package.name, "Ignoring non-array releases");
        }
        None => {
            package.releases.push(
                Release::new(ReleaseKind::Branch {
                    base: None,
                    branch: "master".to_string(),
                })
                .with_sublime_text(options.legacy_sublime_text.clone()),
            );
        }
    }

    package
}

/// Copy optional metadata, skipping values derivable from `details`.
fn carry_metadata(record: &PackageRecord, package: &mut Package) {
    let details = package.details.clone();
    let derivable = |value: &String, rule: fn(&str, &str) -> bool| {
        details
            .as_deref()
            .is_some_and(|details| rule(details, value))
    };

    package.readme = text(record, "readme").filter(|v| !derivable(v, is_default_readme));
    package.issues = text(record, "issues").filter(|v| !derivable(v, is_default_issues));
    package.donate = text(record, "donate").filter(|v| !derivable(v, is_default_donate));
    package.buy = text(record, "buy");
    package.labels = record.get("labels").cloned();
    package.previous_names = record.get("previous_names").cloned();
}

fn is_default_issues(details: &str, issues: &str) -> bool {
    issues == format!("{}/issues", details)
}

/// Repository behind an `https` details URL. Metadata is only derived from those.
fn secure_repository(details: &str) -> Option<RepositoryHomepage> {
    let secure = details
        .get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"));
    match_repository_homepage(details).filter(|_| secure)
}

/// README URLs the package index would find on its own.
fn is_default_readme(details: &str, readme: &str) -> bool {
    let Some(repository) = secure_repository(details) else {
        return false;
    };
    let details = details.to_lowercase();
    let prefixes = match repository.host {
        Host::GitHub => vec![
            format!("{}/blob/master/", details),
            format!(
                "https://raw.githubusercontent.com/{}/{}/master/",
                repository.owner, repository.repo
            )
            .to_lowercase(),
        ],
        Host::Bitbucket => vec![
            format!("{}/raw/master/", details),
            format!("{}/src/master/", details),
        ],
    };

    let readme = readme.to_lowercase();
    prefixes.iter().any(|prefix| {
        readme
            .strip_prefix(prefix.as_str())
            .is_some_and(is_readme_filename)
    })
}

/// Gittip became Gratipay; the old per-user URL is dead.
fn is_default_donate(details: &str, donate: &str) -> bool {
    match secure_repository(details) {
        Some(repository) if repository.host == Host::GitHub => {
            donate == format!("https://www.gittip.com/{}/", repository.owner)
        }
        _ => false,
    }
}

/// Drop a release `base` that repeats the package `details`.
fn elide_base(kind: ReleaseKind, details: Option<&str>) -> ReleaseKind {
    let keep = |base: Option<String>| base.filter(|b| Some(b.as_str()) != details);
    match kind {
        ReleaseKind::Tags { base } => ReleaseKind::Tags { base: keep(base) },
        ReleaseKind::Branch { base, branch } => ReleaseKind::Branch {
            base: keep(base),
            branch,
        },
        explicit => explicit,
    }
}
