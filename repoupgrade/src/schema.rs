//! Repository schema versions.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// A `schema_version` value found in a repository document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Any `1.x` schema, kept verbatim.
    Legacy(String),
    /// Schema `2.0`: releases point at browsable repository URLs.
    V2,
    /// Schema `3.0.0`: releases use `base` plus `tags`/`branch`.
    V3,
}

impl SchemaVersion {
    /// Parse a version string, returning `None` for unknown schemas.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "2.0" => Some(SchemaVersion::V2),
            "3.0.0" => Some(SchemaVersion::V3),
            _ if is_legacy(s) => Some(SchemaVersion::Legacy(s.to_string())),
            _ => None,
        }
    }

    /// Textual form of a JSON `schema_version` value.
    ///
    /// Old repositories occasionally wrote the version as a bare number.
    pub fn text_of(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SchemaVersion::Legacy(s) => s,
            SchemaVersion::V2 => "2.0",
            SchemaVersion::V3 => "3.0.0",
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, SchemaVersion::Legacy(_))
    }

    fn rank(&self) -> u8 {
        match self {
            SchemaVersion::Legacy(_) => 1,
            SchemaVersion::V2 => 2,
            SchemaVersion::V3 => 3,
        }
    }

    /// Returns true if this version is newer than the target.
    pub fn is_newer_than(&self, target: TargetSchema) -> bool {
        self.rank() > target.version().rank()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `1`, `1.0`, `1.2`, ...
fn is_legacy(s: &str) -> bool {
    let mut parts = s.split('.');
    parts.next() == Some("1")
        && parts.all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// The schema a conversion produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetSchema {
    /// Legacy to `2.0`.
    V2,
    /// Legacy or `2.0` to `3.0.0`.
    #[default]
    V3,
}

impl TargetSchema {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetSchema::V2 => "2.0",
            TargetSchema::V3 => "3.0.0",
        }
    }

    pub fn version(&self) -> SchemaVersion {
        match self {
            TargetSchema::V2 => SchemaVersion::V2,
            TargetSchema::V3 => SchemaVersion::V3,
        }
    }
}

impl fmt::Display for TargetSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2" | "2.0" | "2.0.0" => Ok(TargetSchema::V2),
            "3" | "3.0" | "3.0.0" => Ok(TargetSchema::V3),
            other => Err(format!("unknown target schema '{}'", other)),
        }
    }
}
