//! Canonical repository data model.
//!
//! Every conversion builds these values from the parsed source document and
//! hands them to the formatter. A release is exactly one of three kinds,
//! enforced by [`ReleaseKind`]:
//!
//! ```text
//! Release
//! ├── platforms: Option<Platforms>   (None = every platform)
//! ├── sublime_text: Option<String>
//! └── kind: ReleaseKind
//!     ├── Tags     { base }
//!     ├── Branch   { base, branch }
//!     └── Explicit { version, url, date }
//! ```
//!
//! `base` is `None` when the release resolves against the package's
//! `details` URL.

use std::fmt;

use serde_json::Value;

use crate::schema::TargetSchema;

/// Platform tokens treated as "all platforms" when present together.
pub const ALL_PLATFORMS: [&str; 3] = ["linux", "osx", "windows"];

/// Platform value meaning "all platforms".
pub const WILDCARD_PLATFORM: &str = "*";

/// A converted repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
    pub schema_version: TargetSchema,
    pub packages: Vec<Package>,
}

/// A package with canonical fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Package {
    pub name: String,
    pub description: Option<String>,
    pub author: Option<Author>,
    pub details: Option<String>,
    pub homepage: Option<String>,
    pub readme: Option<String>,
    pub issues: Option<String>,
    pub donate: Option<String>,
    pub buy: Option<String>,
    pub labels: Option<Value>,
    pub previous_names: Option<Value>,
    pub releases: Vec<Release>,
    /// Order of the descriptive keys in output.
    pub key_order: KeyOrder,
}

/// Placement of the descriptive package keys, following the source layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOrder {
    /// `description, author, details, homepage`
    #[default]
    Legacy,
    /// `details, description, homepage, author`
    Browse,
}

impl KeyOrder {
    pub fn keys(&self) -> [&'static str; 4] {
        match self {
            KeyOrder::Legacy => ["description", "author", "details", "homepage"],
            KeyOrder::Browse => ["details", "description", "homepage", "author"],
        }
    }
}

/// Package author(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    One(String),
    Many(Vec<String>),
}

impl Author {
    /// Split a comma-separated author into a list, trimming each name.
    pub fn split_names(self) -> Self {
        match self {
            Author::One(name) if name.contains(',') => {
                Author::Many(name.split(',').map(|n| n.trim().to_string()).collect())
            }
            other => other,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Author::One(name) => Value::String(name.clone()),
            Author::Many(names) => Value::from(names.clone()),
        }
    }
}

/// Platforms a release is limited to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platforms(Vec<String>);

impl Platforms {
    pub fn new(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    pub fn single(token: impl Into<String>) -> Self {
        Self(vec![token.into()])
    }

    /// Build a sorted, de-duplicated platform set.
    pub fn merged<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut tokens: Vec<String> = tokens.into_iter().collect();
        tokens.sort();
        tokens.dedup();
        Self(tokens)
    }

    /// Parse a JSON `platforms` value (string or array of strings).
    ///
    /// Arrays come back sorted and de-duplicated.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::single(s.clone())),
            Value::Array(items) => {
                let tokens: Vec<String> = items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                if tokens.is_empty() {
                    None
                } else {
                    Some(Self::merged(tokens))
                }
            }
            _ => None,
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Comma-joined tokens, used for ordering releases.
    pub fn sort_key(&self) -> String {
        self.0.join(",")
    }

    /// True for the wildcard or for a set covering every known platform.
    pub fn is_universal(&self) -> bool {
        if self.0.len() == 1 && self.0[0] == WILDCARD_PLATFORM {
            return true;
        }
        ALL_PLATFORMS
            .iter()
            .all(|platform| self.0.iter().any(|t| t == platform))
    }

    /// A single token serializes bare; several as an array.
    pub fn to_value(&self) -> Value {
        match self.0.as_slice() {
            [one] => Value::String(one.clone()),
            many => Value::from(many.to_vec()),
        }
    }
}

/// A single release of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub platforms: Option<Platforms>,
    pub sublime_text: Option<String>,
    pub kind: ReleaseKind,
}

impl Release {
    pub fn new(kind: ReleaseKind) -> Self {
        Self {
            platforms: None,
            sublime_text: None,
            kind,
        }
    }

    pub fn with_platforms(mut self, platforms: Option<Platforms>) -> Self {
        self.platforms = platforms;
        self
    }

    pub fn with_sublime_text(mut self, sublime_text: impl Into<String>) -> Self {
        self.sublime_text = Some(sublime_text.into());
        self
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self.kind, ReleaseKind::Explicit { .. })
    }
}

/// How a release's download is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReleaseKind {
    /// Resolved from `MAJOR.MINOR.PATCH` tags.
    Tags { base: Option<String> },
    /// Tracks a live branch.
    Branch { base: Option<String>, branch: String },
    /// A fixed download.
    Explicit {
        version: String,
        url: String,
        date: String,
    },
}

impl ReleaseKind {
    pub fn base(&self) -> Option<&str> {
        match self {
            ReleaseKind::Tags { base } | ReleaseKind::Branch { base, .. } => base.as_deref(),
            ReleaseKind::Explicit { .. } => None,
        }
    }
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseKind::Tags { .. } => write!(f, "tags"),
            ReleaseKind::Branch { branch, .. } => write!(f, "branch {}", branch),
            ReleaseKind::Explicit { version, .. } => write!(f, "explicit {}", version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_author_split_trims_names() {
        let author = Author::One("Alice ,  Bob".to_string()).split_names();
        assert_eq!(
            author,
            Author::Many(vec!["Alice".to_string(), "Bob".to_string()])
        );

        let author = Author::One(" Alice, Bob ".to_string()).split_names();
        assert_eq!(
            author,
            Author::Many(vec!["Alice".to_string(), "Bob".to_string()])
        );
    }

    #[test]
    fn test_author_without_comma_is_unchanged() {
        let author = Author::One("Alice".to_string()).split_names();
        assert_eq!(author, Author::One("Alice".to_string()));
    }

    #[test]
    fn test_platforms_merged_sorts_and_dedups() {
        let platforms = Platforms::merged(vec![
            "osx".to_string(),
            "linux".to_string(),
            "osx".to_string(),
        ]);
        assert_eq!(platforms.tokens(), &["linux", "osx"]);
        assert_eq!(platforms.sort_key(), "linux,osx");
    }

    #[test]
    fn test_platforms_universal() {
        assert!(Platforms::single("*").is_universal());
        assert!(Platforms::merged(ALL_PLATFORMS.iter().map(|s| s.to_string())).is_universal());
        assert!(!Platforms::single("linux").is_universal());
        assert!(!Platforms::new(vec!["linux".into(), "windows".into()]).is_universal());
    }

    #[test]
    fn test_platforms_value_shape() {
        assert_eq!(Platforms::single("osx").to_value(), json!("osx"));
        assert_eq!(
            Platforms::new(vec!["linux".into(), "osx".into()]).to_value(),
            json!(["linux", "osx"])
        );
    }

    #[test]
    fn test_platforms_from_value() {
        assert_eq!(
            Platforms::from_value(&json!(["windows-x64", "osx-x64"])),
            Some(Platforms::new(vec!["osx-x64".into(), "windows-x64".into()]))
        );
        assert_eq!(
            Platforms::from_value(&json!(["linux", "linux"])),
            Some(Platforms::single("linux"))
        );
        assert_eq!(Platforms::from_value(&json!([])), None);
        assert_eq!(Platforms::from_value(&json!(3)), None);
    }
}
