//! Conversion options and the `config.ini` file.
//!
//! [`UpgradeOptions`] carries the knobs the conversion needs. The CLI builds
//! them from [`ConfigFile`], which persists the same settings in an INI file:
//!
//! ```ini
//! [upgrade]
//! target = 3.0.0
//! sublime_text = <3000
//! default_date = 2011-09-01 00:00:00
//! default_version = 1.0.0
//! version_order = lexical
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use semver::Version;

use crate::error::ConfigError;
use crate::schema::TargetSchema;

/// Sublime Text range given to releases converted from legacy repositories,
/// which predate Sublime Text 3.
pub const DEFAULT_LEGACY_SUBLIME_TEXT: &str = "<3000";

/// Date given to legacy releases whose package has no `last_modified`.
pub const DEFAULT_RELEASE_DATE: &str = "2011-09-01 00:00:00";

/// Version given to legacy releases without one.
pub const DEFAULT_RELEASE_VERSION: &str = "1.0.0";

const CONFIG_DIR_NAME: &str = "repoupgrade";
const CONFIG_FILE_NAME: &str = "config.ini";
const SECTION: &str = "upgrade";

/// How explicit releases are ordered when a package is re-sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionOrder {
    /// Plain string comparison, so "10.0.0" sorts before "2.0.0".
    #[default]
    Lexical,
    /// Semantic version comparison. Versions that do not parse sort below
    /// all that do, in string order among themselves.
    Semantic,
}

impl VersionOrder {
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            VersionOrder::Lexical => a.cmp(b),
            VersionOrder::Semantic => {
                let key = |v: &str| {
                    let parsed = parse_loose(v);
                    (parsed.is_some(), parsed)
                };
                key(a).cmp(&key(b)).then_with(|| a.cmp(b))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionOrder::Lexical => "lexical",
            VersionOrder::Semantic => "semantic",
        }
    }
}

impl FromStr for VersionOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lexical" => Ok(VersionOrder::Lexical),
            "semantic" | "semver" => Ok(VersionOrder::Semantic),
            other => Err(format!("unknown version order '{}'", other)),
        }
    }
}

/// Parse `v1.2`, `1.2` or `1.2.3` as a semantic version.
fn parse_loose(version: &str) -> Option<Version> {
    let version = version.strip_prefix('v').unwrap_or(version);
    Version::parse(version)
        .or_else(|_| Version::parse(&format!("{}.0", version)))
        .ok()
}

/// Options for a single conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Schema to convert to.
    pub target: TargetSchema,

    /// Sublime Text range for releases converted from legacy repositories.
    pub legacy_sublime_text: String,

    /// Release date used when a legacy package has no `last_modified`.
    pub default_date: String,

    /// Release version used when a release has none.
    pub default_version: String,

    /// Ordering of re-sorted explicit releases.
    pub version_order: VersionOrder,
}

impl Default for UpgradeOptions {
    fn default() -> Self {
        Self {
            target: TargetSchema::V3,
            legacy_sublime_text: DEFAULT_LEGACY_SUBLIME_TEXT.to_string(),
            default_date: DEFAULT_RELEASE_DATE.to_string(),
            default_version: DEFAULT_RELEASE_VERSION.to_string(),
            version_order: VersionOrder::Lexical,
        }
    }
}

impl UpgradeOptions {
    /// Create options converting to the given schema.
    pub fn new(target: TargetSchema) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: TargetSchema) -> Self {
        self.target = target;
        self
    }

    pub fn with_legacy_sublime_text(mut self, range: impl Into<String>) -> Self {
        self.legacy_sublime_text = range.into();
        self
    }

    pub fn with_default_date(mut self, date: impl Into<String>) -> Self {
        self.default_date = date.into();
        self
    }

    pub fn with_default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = version.into();
        self
    }

    pub fn with_version_order(mut self, order: VersionOrder) -> Self {
        self.version_order = order;
        self
    }
}

/// Settings persisted in `config.ini`. Unset keys use built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub target: Option<TargetSchema>,
    pub sublime_text: Option<String>,
    pub default_date: Option<String>,
    pub default_version: Option<String>,
    pub version_order: Option<VersionOrder>,
}

/// Default location of `config.ini`.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

impl ConfigFile {
    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text).map_err(|e| match e {
                ConfigError::Read { reason, .. } => ConfigError::Read {
                    path: path.display().to_string(),
                    reason,
                },
                other => other,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Read {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: "<string>".to_string(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();
        if let Some(section) = ini.section(Some(SECTION)) {
            for key in ConfigKey::all() {
                if let Some(value) = section.get(key.key_name()) {
                    key.set(&mut config, value)?;
                }
            }
        }
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(SECTION)).set(key.key_name(), value);
            }
        }
        ini.write_to_file(path).map_err(write_error)
    }

    /// Resolve into conversion options, filling defaults.
    pub fn to_options(&self) -> UpgradeOptions {
        let defaults = UpgradeOptions::default();
        UpgradeOptions {
            target: self.target.unwrap_or(defaults.target),
            legacy_sublime_text: self
                .sublime_text
                .clone()
                .unwrap_or(defaults.legacy_sublime_text),
            default_date: self.default_date.clone().unwrap_or(defaults.default_date),
            default_version: self
                .default_version
                .clone()
                .unwrap_or(defaults.default_version),
            version_order: self.version_order.unwrap_or(defaults.version_order),
        }
    }
}

/// A settable configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    UpgradeTarget,
    UpgradeSublimeText,
    UpgradeDefaultDate,
    UpgradeDefaultVersion,
    UpgradeVersionOrder,
}

impl ConfigKey {
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::UpgradeTarget,
            ConfigKey::UpgradeSublimeText,
            ConfigKey::UpgradeDefaultDate,
            ConfigKey::UpgradeDefaultVersion,
            ConfigKey::UpgradeVersionOrder,
        ]
    }

    pub fn section(&self) -> &'static str {
        SECTION
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::UpgradeTarget => "target",
            ConfigKey::UpgradeSublimeText => "sublime_text",
            ConfigKey::UpgradeDefaultDate => "default_date",
            ConfigKey::UpgradeDefaultVersion => "default_version",
            ConfigKey::UpgradeVersionOrder => "version_order",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value, or an empty string when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::UpgradeTarget => config.target.map(|t| t.to_string()),
            ConfigKey::UpgradeSublimeText => config.sublime_text.clone(),
            ConfigKey::UpgradeDefaultDate => config.default_date.clone(),
            ConfigKey::UpgradeDefaultVersion => config.default_version.clone(),
            ConfigKey::UpgradeVersionOrder => config.version_order.map(|o| o.to_string()),
        }
        .unwrap_or_default()
    }

    /// Set a value; an empty string unsets the key.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = || ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
        };
        let text = (!value.is_empty()).then(|| value.to_string());

        match self {
            ConfigKey::UpgradeTarget => {
                config.target = text
                    .map(|v| v.parse::<TargetSchema>().map_err(|_| invalid()))
                    .transpose()?;
            }
            ConfigKey::UpgradeSublimeText => config.sublime_text = text,
            ConfigKey::UpgradeDefaultDate => config.default_date = text,
            ConfigKey::UpgradeDefaultVersion => config.default_version = text,
            ConfigKey::UpgradeVersionOrder => {
                config.version_order = text
                    .map(|v| v.parse::<VersionOrder>().map_err(|_| invalid()))
                    .transpose()?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for VersionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s || key.key_name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = UpgradeOptions::default();
        assert_eq!(options.target, TargetSchema::V3);
        assert_eq!(options.legacy_sublime_text, "<3000");
        assert_eq!(options.default_date, "2011-09-01 00:00:00");
        assert_eq!(options.version_order, VersionOrder::Lexical);
    }

    #[test]
    fn test_builder_pattern() {
        let options = UpgradeOptions::new(TargetSchema::V2)
            .with_legacy_sublime_text("*")
            .with_default_date("2014-01-01 00:00:00")
            .with_version_order(VersionOrder::Semantic);
        assert_eq!(options.target, TargetSchema::V2);
        assert_eq!(options.legacy_sublime_text, "*");
        assert_eq!(options.default_date, "2014-01-01 00:00:00");
        assert_eq!(options.version_order, VersionOrder::Semantic);
    }

    #[test]
    fn test_lexical_order_is_string_order() {
        assert_eq!(
            VersionOrder::Lexical.compare("10.0.0", "2.0.0"),
            Ordering::Less
        );
    }

    #[test]
    fn test_semantic_order() {
        assert_eq!(
            VersionOrder::Semantic.compare("10.0.0", "2.0.0"),
            Ordering::Greater
        );
        assert_eq!(VersionOrder::Semantic.compare("v1.2", "1.2.0"), Ordering::Greater);
        assert_eq!(
            VersionOrder::Semantic.compare("beta", "alpha"),
            Ordering::Greater
        );
    }

    #[test]
    fn test_semantic_order_ranks_unparsed_below_parsed() {
        let order = VersionOrder::Semantic;
        assert_eq!(order.compare("10.0.0x", "2.0.0"), Ordering::Less);
        assert_eq!(order.compare("10.0.0", "10.0.0x"), Ordering::Greater);
        assert_eq!(order.compare("2.0.0", "10.0.0"), Ordering::Less);
    }

    #[test]
    fn test_semantic_order_is_consistent_for_mixed_versions() {
        let mut versions: Vec<String> = (0..40)
            .map(|n| match n % 3 {
                1 => format!("{}.0.0x", n),
                _ => format!("{}.0.0", n),
            })
            .collect();
        versions.sort_by(|a, b| VersionOrder::Semantic.compare(b, a));

        for pair in versions.windows(2) {
            assert_ne!(
                VersionOrder::Semantic.compare(&pair[0], &pair[1]),
                Ordering::Less,
                "{} before {}",
                pair[0],
                pair[1]
            );
        }
        assert_eq!(versions[0], "39.0.0");
        assert!(versions.last().unwrap().ends_with('x'));
    }

    #[test]
    fn test_parse_ini() {
        let config = ConfigFile::parse(
            "[upgrade]\ntarget = 2.0\nversion_order = semantic\nsublime_text = *\n",
        )
        .unwrap();
        assert_eq!(config.target, Some(TargetSchema::V2));
        assert_eq!(config.version_order, Some(VersionOrder::Semantic));
        assert_eq!(config.sublime_text.as_deref(), Some("*"));
        assert_eq!(config.default_date, None);

        let options = config.to_options();
        assert_eq!(options.target, TargetSchema::V2);
        assert_eq!(options.default_date, DEFAULT_RELEASE_DATE);
    }

    #[test]
    fn test_parse_rejects_bad_value() {
        let err = ConfigFile::parse("[upgrade]\ntarget = 9\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        ConfigKey::UpgradeTarget.set(&mut config, "2.0").unwrap();
        ConfigKey::UpgradeDefaultDate
            .set(&mut config, "2015-05-05 00:00:00")
            .unwrap();
        config.save_to(&path).unwrap();

        let reloaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_config_key_names() {
        let key: ConfigKey = "upgrade.version_order".parse().unwrap();
        assert_eq!(key, ConfigKey::UpgradeVersionOrder);
        assert_eq!(key.name(), "upgrade.version_order");
        assert!("upgrade.nope".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_empty_value_unsets() {
        let mut config = ConfigFile {
            sublime_text: Some("*".to_string()),
            ..Default::default()
        };
        ConfigKey::UpgradeSublimeText.set(&mut config, "").unwrap();
        assert_eq!(config.sublime_text, None);
        assert_eq!(ConfigKey::UpgradeSublimeText.get(&config), "");
    }
}
