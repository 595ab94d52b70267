//! The `upgrade` command.

use std::path::{Path, PathBuf};

use clap::Args;
use repoupgrade::{upgrade_repository, Outcome, TargetSchema, UpgradeOptions, VersionOrder};
use tracing::info;

use super::common::{is_stdin, load_config, read_input, write_output};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct UpgradeArgs {
    /// Repository JSON file, or - for stdin
    pub input: PathBuf,

    /// Target schema: 2.0 or 3.0.0 (default from config, else 3.0.0)
    #[arg(long, value_name = "SCHEMA")]
    pub to: Option<TargetSchema>,

    /// Rewrite the input file instead of printing to stdout
    #[arg(long)]
    pub in_place: bool,

    /// Sort merged explicit releases by semantic version
    #[arg(long)]
    pub semantic_sort: bool,

    /// Read settings from this file instead of the default config.ini
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl UpgradeArgs {
    /// Config settings with command-line flags applied on top.
    fn options(&self) -> Result<UpgradeOptions, CliError> {
        let mut options = load_config(self.config.as_deref())?.to_options();
        if let Some(target) = self.to {
            options = options.with_target(target);
        }
        if self.semantic_sort {
            options = options.with_version_order(VersionOrder::Semantic);
        }
        Ok(options)
    }
}

/// Run the upgrade command.
pub fn run(args: UpgradeArgs) -> Result<(), CliError> {
    if args.in_place && is_stdin(&args.input) {
        return Err(CliError::Config(
            "--in-place needs a file path, not stdin".to_string(),
        ));
    }

    let options = args.options()?;

    let outcome = if args.in_place {
        let outcome = upgrade_file(&args.input, &options)?;
        if matches!(outcome, Outcome::Success { .. }) {
            info!(path = %args.input.display(), "Rewrote repository file");
        }
        outcome
    } else {
        let outcome = upgrade_repository(&read_input(&args.input)?, &options)?;
        if let Outcome::Success { document, .. } = &outcome {
            print!("{}", document);
        }
        outcome
    };

    match outcome {
        Outcome::Noop(message) => eprintln!("{}", message),
        Outcome::Success {
            advisory: Some(advisory),
            ..
        } => eprintln!("\n{}", advisory),
        Outcome::Success { advisory: None, .. } => {}
    }

    Ok(())
}

/// Upgrade a file in place with the given options.
pub fn upgrade_file(path: &Path, options: &UpgradeOptions) -> Result<Outcome, CliError> {
    let text = read_input(path)?;
    let outcome = upgrade_repository(&text, options)?;
    if let Outcome::Success { document, .. } = &outcome {
        write_output(path, document)?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LEGACY: &str = r#"{"schema_version": "1.2", "packages": [{
        "name": "Foo",
        "homepage": "https://github.com/bar/foo",
        "platforms": {"*": [{"version": "1.0.0", "url": "https://codeload.github.com/bar/foo/zip/1.0.0"}]}
    }]}"#;

    fn args(input: PathBuf) -> UpgradeArgs {
        UpgradeArgs {
            input,
            to: None,
            in_place: true,
            semantic_sort: false,
            config: None,
        }
    }

    #[test]
    fn test_in_place_upgrade_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("packages.json");
        let config = dir.path().join("config.ini");
        fs::write(&path, LEGACY).unwrap();

        let mut args = args(path.clone());
        args.config = Some(config);
        run(args).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n\t\"schema_version\": \"3.0.0\""));
        assert!(text.contains("\"tags\": true"));
    }

    #[test]
    fn test_flags_override_config() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.ini");
        fs::write(&config, "[upgrade]\ntarget = 3.0.0\nsublime_text = *\n").unwrap();

        let mut args = args(dir.path().join("packages.json"));
        args.config = Some(config);
        args.to = Some(TargetSchema::V2);
        args.semantic_sort = true;

        let options = args.options().unwrap();
        assert_eq!(options.target, TargetSchema::V2);
        assert_eq!(options.legacy_sublime_text, "*");
        assert_eq!(options.version_order, VersionOrder::Semantic);
    }

    #[test]
    fn test_in_place_rejects_stdin() {
        let err = run(args(PathBuf::from("-"))).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_rejected_document_exits_with_one() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("packages.json");
        fs::write(&path, r#"{"packages": []}"#).unwrap();

        let err = upgrade_file(&path, &UpgradeOptions::default()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"packages": []}"#);
    }

    #[test]
    fn test_noop_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("packages.json");
        let original = r#"{"schema_version": "3.0.0", "packages": []}"#;
        fs::write(&path, original).unwrap();

        let outcome = upgrade_file(&path, &UpgradeOptions::default()).unwrap();
        assert!(matches!(outcome, Outcome::Noop(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }
}
