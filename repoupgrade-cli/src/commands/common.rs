//! Common utilities shared across CLI commands.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use repoupgrade::config::ConfigFile;

use crate::error::CliError;

/// Path argument meaning standard input.
pub const STDIN_PATH: &str = "-";

pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN_PATH
}

/// Read a repository document from a file or stdin.
pub fn read_input(path: &Path) -> Result<String, CliError> {
    if is_stdin(path) {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|source| CliError::Read {
                path: "<stdin>".to_string(),
                source,
            })?;
        return Ok(text);
    }

    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

pub fn write_output(path: &Path, text: &str) -> Result<(), CliError> {
    fs::write(path, text).map_err(|source| CliError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Load settings from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoupgrade::TargetSchema;
    use tempfile::TempDir;

    #[test]
    fn test_stdin_path() {
        assert!(is_stdin(Path::new("-")));
        assert!(!is_stdin(Path::new("packages.json")));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_input(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("packages.json");
        write_output(&path, "{}\n").unwrap();
        assert_eq!(read_input(&path).unwrap(), "{}\n");
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, "[upgrade]\ntarget = 2.0\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.target, Some(TargetSchema::V2));
    }
}
