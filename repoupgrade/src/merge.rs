//! Release merging and cleanup.
//!
//! Legacy repositories list one release per platform, so converting them
//! yields runs of releases that differ only in `platforms`. Those collapse
//! into one release with a platform list.

use std::collections::HashMap;

use tracing::trace;

use crate::config::UpgradeOptions;
use crate::model::{Platforms, Release, ReleaseKind};

/// Grouping identity: everything except the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MergeKey {
    kind: ReleaseKind,
    sublime_text: String,
}

/// Collapse releases that differ only in platform.
///
/// Releases without platforms never merge. If nothing merged, the input is
/// returned untouched. Otherwise merged groups follow the unmerged releases
/// and, when every release is explicit, the result is sorted by platform
/// list and then by version descending.
pub fn merge_releases(releases: Vec<Release>, options: &UpgradeOptions) -> Vec<Release> {
    let mut unmerged = Vec::new();
    let mut groups: Vec<(MergeKey, Vec<String>)> = Vec::new();
    let mut index: HashMap<MergeKey, usize> = HashMap::new();

    for release in &releases {
        let Some(platforms) = &release.platforms else {
            unmerged.push(release.clone());
            continue;
        };

        let key = MergeKey {
            kind: release.kind.clone(),
            sublime_text: release
                .sublime_text
                .clone()
                .unwrap_or_else(|| options.legacy_sublime_text.clone()),
        };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.extend(platforms.tokens().iter().cloned());
    }

    if unmerged.len() + groups.len() == releases.len() {
        return releases;
    }

    trace!(
        before = releases.len(),
        after = unmerged.len() + groups.len(),
        "Merged platform releases"
    );

    let mut merged = unmerged;
    merged.extend(groups.into_iter().map(|(key, tokens)| Release {
        platforms: Some(Platforms::merged(tokens)),
        sublime_text: Some(key.sublime_text),
        kind: key.kind,
    }));

    if merged.iter().all(Release::is_explicit) {
        merged.sort_by(|a, b| {
            platform_key(a).cmp(&platform_key(b)).then_with(|| {
                options
                    .version_order
                    .compare(explicit_version(b), explicit_version(a))
            })
        });
    }

    merged
}

fn platform_key(release: &Release) -> String {
    release
        .platforms
        .as_ref()
        .map(Platforms::sort_key)
        .unwrap_or_default()
}

fn explicit_version(release: &Release) -> &str {
    match &release.kind {
        ReleaseKind::Explicit { version, .. } => version,
        _ => "",
    }
}

/// Drop universal platform sets and rewrite obsolete version ranges.
pub fn normalize_release(release: &mut Release) {
    if release.platforms.as_ref().is_some_and(Platforms::is_universal) {
        release.platforms = None;
    }
    if let Some(fixed) = release.sublime_text.as_deref().and_then(fix_sublime_text) {
        release.sublime_text = Some(fixed.to_string());
    }
}

fn fix_sublime_text(range: &str) -> Option<&'static str> {
    match range {
        ">2999" | ">3000" => Some(">=3000"),
        "<=2999" | "<=3000" => Some("<3000"),
        _ => None,
    }
}
