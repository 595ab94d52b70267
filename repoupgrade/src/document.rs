//! Repository document parsing.
//!
//! Reads the raw JSON text, works out which schema it declares and hands the
//! package records to the normalizer. All rejection happens here, before any
//! package is touched.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{UpgradeError, UpgradeResult};
use crate::schema::{SchemaVersion, TargetSchema};

/// A package record as found in the source document.
pub type PackageRecord = Map<String, Value>;

/// A parsed document ready for conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub version: SchemaVersion,
    pub packages: Vec<PackageRecord>,
}

/// Result of reading a document against a target schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// The document needs converting.
    Ready(SourceDocument),
    /// The document already uses the target schema.
    AlreadyAtTarget(String),
}

/// Parse `text` for conversion to `target`.
pub fn parse_document(text: &str, target: TargetSchema) -> UpgradeResult<Parsed> {
    let root = parse_object(text)?;
    let version = declared_version(&root)?;

    if version == target.version() {
        return Ok(Parsed::AlreadyAtTarget(format!(
            "The JSON indicates it is using schema {}, thus it does not need to be upgraded.",
            version
        )));
    }

    if version.is_newer_than(target) {
        return Err(UpgradeError::UnsupportedConversion {
            from: version.to_string(),
            to: target.to_string(),
        });
    }

    let packages = package_records(&root)?;
    Ok(Parsed::Ready(SourceDocument { version, packages }))
}

fn parse_object(text: &str) -> UpgradeResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(root)) => Ok(root),
        Ok(_) => Err(UpgradeError::MalformedInput(
            "expected a JSON object at the top level".to_string(),
        )),
        Err(e) => Err(UpgradeError::MalformedInput(e.to_string())),
    }
}

fn declared_version(root: &Map<String, Value>) -> UpgradeResult<SchemaVersion> {
    let value = root
        .get("schema_version")
        .ok_or(UpgradeError::MissingVersion)?;
    let text = SchemaVersion::text_of(value);
    SchemaVersion::parse(&text).ok_or(UpgradeError::UnsupportedVersion(text))
}

/// Package records from either an array or a name-keyed object.
fn package_records(root: &Map<String, Value>) -> UpgradeResult<Vec<PackageRecord>> {
    let records = match root.get("packages") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match item {
                Value::Object(record) => Some(record.clone()),
                other => {
                    warn!(index, kind = value_kind(other), "Skipping non-object package entry");
                    None
                }
            })
            .collect(),
        Some(Value::Object(by_name)) => by_name
            .iter()
            .filter_map(|(name, item)| match item {
                Value::Object(record) => {
                    let mut record = record.clone();
                    if !record.contains_key("name") {
                        record.insert("name".to_string(), Value::String(name.clone()));
                    }
                    Some(record)
                }
                other => {
                    warn!(package = %name, kind = value_kind(other), "Skipping non-object package entry");
                    None
                }
            })
            .collect(),
        _ => return Err(UpgradeError::MissingPackages),
    };
    Ok(records)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Overview of a repository document, without converting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub schema_version: String,
    pub packages: usize,
    pub releases: usize,
    pub package_names: Vec<String>,
}

/// Summarize a document of any known schema.
pub fn summarize(text: &str) -> UpgradeResult<DocumentSummary> {
    let root = parse_object(text)?;
    let version = declared_version(&root)?;
    let packages = package_records(&root)?;

    let releases = packages
        .iter()
        .map(|record| match &version {
            SchemaVersion::Legacy(_) => record
                .get("platforms")
                .and_then(Value::as_object)
                .map(|platforms| {
                    platforms
                        .values()
                        .filter_map(Value::as_array)
                        .map(Vec::len)
                        .sum::<usize>()
                })
                .unwrap_or(0),
            SchemaVersion::V2 | SchemaVersion::V3 => record
                .get("releases")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0),
        })
        .sum();

    Ok(DocumentSummary {
        schema_version: version.to_string(),
        packages: packages.len(),
        releases,
        package_names: packages
            .iter()
            .filter_map(|record| record.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_json() {
        let err = parse_document("{not json", TargetSchema::V3).unwrap_err();
        assert!(matches!(err, UpgradeError::MalformedInput(_)));
    }

    #[test]
    fn test_top_level_array_is_malformed() {
        let err = parse_document("[]", TargetSchema::V3).unwrap_err();
        assert!(matches!(err, UpgradeError::MalformedInput(_)));
    }

    #[test]
    fn test_missing_version() {
        let err = parse_document(r#"{"packages": []}"#, TargetSchema::V3).unwrap_err();
        assert_eq!(err, UpgradeError::MissingVersion);
    }

    #[test]
    fn test_unknown_version() {
        let err =
            parse_document(r#"{"schema_version": "9.9", "packages": []}"#, TargetSchema::V3)
                .unwrap_err();
        assert_eq!(err, UpgradeError::UnsupportedVersion("9.9".to_string()));
    }

    #[test]
    fn test_already_at_target_is_checked_before_packages() {
        let parsed = parse_document(r#"{"schema_version": "3.0.0"}"#, TargetSchema::V3).unwrap();
        match parsed {
            Parsed::AlreadyAtTarget(msg) => assert!(msg.contains("3.0.0")),
            other => panic!("expected noop, got {:?}", other),
        }
    }

    #[test]
    fn test_downgrade_is_rejected() {
        let err = parse_document(
            r#"{"schema_version": "3.0.0", "packages": []}"#,
            TargetSchema::V2,
        )
        .unwrap_err();
        assert!(matches!(err, UpgradeError::UnsupportedConversion { .. }));
    }

    #[test]
    fn test_missing_packages() {
        let err = parse_document(r#"{"schema_version": "1.2"}"#, TargetSchema::V3).unwrap_err();
        assert_eq!(err, UpgradeError::MissingPackages);
    }

    #[test]
    fn test_numeric_schema_version() {
        let parsed =
            parse_document(r#"{"schema_version": 1.2, "packages": []}"#, TargetSchema::V3)
                .unwrap();
        match parsed {
            Parsed::Ready(doc) => {
                assert_eq!(doc.version, SchemaVersion::Legacy("1.2".to_string()))
            }
            other => panic!("expected ready, got {:?}", other),
        }
    }

    #[test]
    fn test_package_map_fills_names_and_skips_non_objects() {
        let parsed = parse_document(
            r#"{"schema_version": "2.0", "packages": {"Foo": {}, "Bar": {"name": "Baz"}, "Bad": 3}}"#,
            TargetSchema::V3,
        )
        .unwrap();
        let Parsed::Ready(doc) = parsed else {
            panic!("expected ready");
        };
        let names: Vec<_> = doc
            .packages
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Foo", "Baz"]);
    }

    #[test]
    fn test_summarize_legacy() {
        let summary = summarize(
            r#"{"schema_version": "1.2", "packages": [
                {"name": "A", "platforms": {"*": [{"version": "1.0"}], "osx": [{}, {}]}},
                {"name": "B"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(summary.schema_version, "1.2");
        assert_eq!(summary.packages, 2);
        assert_eq!(summary.releases, 3);
        assert_eq!(summary.package_names, vec!["A", "B"]);
    }
}
