//! Output rendering.
//!
//! Builds the target-schema JSON with a fixed key order, pretty-prints it
//! with tab indentation and folds short string arrays onto one line so the
//! result reads like a hand-maintained `packages.json`.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::hosts::Host;
use crate::model::{Package, Release, ReleaseKind, Repository};
use crate::schema::TargetSchema;

/// Render a converted repository as document text.
pub fn render(repository: &Repository) -> String {
    let text = pretty(&to_value(repository));
    let text = fold_arrays(&text);

    let mut out = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

/// Build the JSON value for a repository.
pub fn to_value(repository: &Repository) -> Value {
    let target = repository.schema_version;
    let mut root = Map::new();
    root.insert(
        "schema_version".to_string(),
        Value::String(target.as_str().to_string()),
    );
    root.insert(
        "packages".to_string(),
        Value::Array(
            repository
                .packages
                .iter()
                .map(|package| package_value(package, target))
                .collect(),
        ),
    );
    Value::Object(root)
}

fn package_value(package: &Package, target: TargetSchema) -> Value {
    let mut out = Map::new();
    out.insert("name".to_string(), Value::String(package.name.clone()));

    let mut put = |key: &str, value: Option<Value>| {
        if let Some(value) = value {
            out.insert(key.to_string(), value);
        }
    };
    let string = |value: &Option<String>| value.clone().map(Value::String);

    for key in package.key_order.keys() {
        let value = match key {
            "description" => string(&package.description),
            "author" => package.author.as_ref().map(|a| a.to_value()),
            "details" => string(&package.details),
            _ => string(&package.homepage),
        };
        put(key, value);
    }
    put("readme", string(&package.readme));
    put("issues", string(&package.issues));
    put("donate", string(&package.donate));
    put("buy", string(&package.buy));
    put("labels", package.labels.clone());
    put("previous_names", package.previous_names.clone());

    let releases = package
        .releases
        .iter()
        .map(|release| release_value(release, package.details.as_deref(), target))
        .collect();
    out.insert("releases".to_string(), Value::Array(releases));

    Value::Object(out)
}

fn release_value(release: &Release, package_details: Option<&str>, target: TargetSchema) -> Value {
    let mut out = Map::new();
    if let Some(platforms) = &release.platforms {
        out.insert("platforms".to_string(), platforms.to_value());
    }
    if let Some(range) = &release.sublime_text {
        out.insert("sublime_text".to_string(), Value::String(range.clone()));
    }

    match (&release.kind, target) {
        (ReleaseKind::Explicit { version, url, date }, _) => {
            out.insert("version".to_string(), Value::String(version.clone()));
            out.insert("url".to_string(), Value::String(url.clone()));
            out.insert("date".to_string(), Value::String(date.clone()));
        }
        (kind, TargetSchema::V2) => {
            if let Some(details) = browse_details(kind, package_details) {
                out.insert("details".to_string(), Value::String(details));
            }
        }
        (ReleaseKind::Tags { base }, TargetSchema::V3) => {
            out.insert("tags".to_string(), Value::Bool(true));
            if let Some(base) = base {
                out.insert("base".to_string(), Value::String(base.clone()));
            }
        }
        (ReleaseKind::Branch { base, branch }, TargetSchema::V3) => {
            out.insert("branch".to_string(), Value::String(branch.clone()));
            if let Some(base) = base {
                out.insert("base".to_string(), Value::String(base.clone()));
            }
        }
    }

    Value::Object(out)
}

/// Browsable 2.0 `details` URL for a tag or branch release.
fn browse_details(kind: &ReleaseKind, package_details: Option<&str>) -> Option<String> {
    let base = kind.base().or(package_details)?;
    let Some(host) = Host::of_base(base) else {
        return Some(base.to_string());
    };
    match kind {
        ReleaseKind::Tags { .. } => Some(host.tags_url(base)),
        ReleaseKind::Branch { branch, .. } => Some(host.branch_url(base, branch)),
        ReleaseKind::Explicit { .. } => None,
    }
}

fn pretty(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    value
        .serialize(&mut serializer)
        .expect("serializing a JSON value into memory cannot fail");
    String::from_utf8_lossy(&buf).into_owned()
}

/// Put `author`, `platforms`, `labels` and `previous_names` arrays on one line.
fn fold_arrays(text: &str) -> String {
    static ARRAY: OnceLock<Regex> = OnceLock::new();
    static OPEN: OnceLock<Regex> = OnceLock::new();
    static CLOSE: OnceLock<Regex> = OnceLock::new();
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();

    let array = ARRAY.get_or_init(|| {
        Regex::new(r#"(?s)"(author|platforms|labels|previous_names)": \[.*?\]"#).unwrap()
    });
    let open = OPEN.get_or_init(|| Regex::new(r#"\[\s*\n\s*""#).unwrap());
    let close = CLOSE.get_or_init(|| Regex::new(r#""\s*\n\s*\]"#).unwrap());
    let separator = SEPARATOR.get_or_init(|| Regex::new(r#"",\s*\n\s*""#).unwrap());

    array
        .replace_all(text, |caps: &Captures| {
            let folded = open.replace_all(&caps[0], "[\"");
            let folded = close.replace_all(&folded, "\"]");
            separator.replace_all(&folded, "\", \"").into_owned()
        })
        .into_owned()
}
