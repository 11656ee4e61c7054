//! Configuration file reading and writing.
//!
//! This module handles locating the credentials file and reading or
//! writing JSON documents on disk.
//!
//! # File Location
//!
//! The credentials file is resolved in the following order:
//!
//! 1. An explicit path (usually the `--config` command-line flag)
//! 2. The `BBPR_CONFIG` environment variable
//! 3. User: `~/.config/bbpr/credentials.json`

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Environment variable overriding the credentials file location.
pub const CONFIG_PATH_ENV: &str = "BBPR_CONFIG";

/// User config directory name.
const USER_CONFIG_DIR: &str = "bbpr";

/// Credentials file name inside the user config directory.
const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Returns the default user configuration directory.
///
/// This is typically `~/.config/bbpr/` on Unix systems.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn user_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(USER_CONFIG_DIR))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// Returns the default credentials file path.
///
/// This is typically `~/.config/bbpr/credentials.json`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_credentials_path() -> Result<PathBuf> {
    Ok(user_config_dir()?.join(CREDENTIALS_FILE_NAME))
}

/// Resolves where the credentials file lives.
///
/// An explicit path wins, then the `BBPR_CONFIG` environment variable, then
/// the default user location. Empty values are ignored.
///
/// # Errors
///
/// Returns an error only when falling back to the default location and the
/// home directory cannot be determined.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use bbpr_config::persistence::resolve_credentials_path;
///
/// let path = resolve_credentials_path(Some(PathBuf::from("creds.json"))).unwrap();
/// assert_eq!(path, PathBuf::from("creds.json"));
/// ```
pub fn resolve_credentials_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let from_env = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    resolve_with(explicit, from_env)
}

fn resolve_with(explicit: Option<PathBuf>, from_env: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    if let Some(path) = from_env.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    default_credentials_path()
}

/// Reads and parses a configuration file.
///
/// The content is parsed as plain JSON first and, if that fails, as JSON5.
/// Files written by [`write_config_file`] always take the plain JSON path,
/// which matters for strings holding U+2028 or U+2029: JSON allows them
/// unescaped, JSON5 treats them as line terminators.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The file content cannot be parsed
pub fn read_config_file<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&content)
        .or_else(|_| serde_json5::from_str(&content))
        .map_err(ConfigError::from)
}

/// Writes a value to a file as pretty-printed JSON, replacing any existing
/// content.
///
/// The write is not atomic: a crash mid-write can leave a truncated file.
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The file cannot be written
/// - The value cannot be serialized
pub fn write_config_file<T: serde::Serialize>(path: impl AsRef<Path>, config: &T) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty() && !p.exists())
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = serde_json::to_string_pretty(config)?;

    std::fs::write(path, content).map_err(|e| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        name: String,
        value: i32,
    }

    #[test]
    fn read_json5_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.json5");
        std::fs::write(
            &path,
            r#"
            {
                // comment
                name: "test",
                value: 42,
            }
            "#,
        )
        .unwrap();

        let config: TestConfig = read_config_file(&path).unwrap();
        assert_eq!(config.name, "test");
        assert_eq!(config.value, 42);
    }

    #[test]
    fn read_nonexistent_file() {
        let result: Result<TestConfig> = read_config_file("/nonexistent/path.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn read_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("invalid.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result: Result<TestConfig> = read_config_file(&path);
        assert!(matches!(result, Err(ConfigError::ParseJson5(_))));
    }

    #[test]
    fn line_and_paragraph_separators_survive_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("separators.json");
        let config = TestConfig {
            name: "a\u{2028}b\u{2029}c".to_string(),
            value: 3,
        };
        write_config_file(&path, &config).unwrap();

        let loaded: TestConfig = read_config_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn write_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "old content that is longer than the new one").unwrap();

        let config = TestConfig {
            name: "new".to_string(),
            value: 1,
        };
        write_config_file(&path, &config).unwrap();

        let loaded: TestConfig = read_config_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn write_is_pretty_printed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pretty.json");
        let config = TestConfig {
            name: "x".to_string(),
            value: 7,
        };
        write_config_file(&path, &config).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"name\": \"x\""));
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dirs").join("config.json");

        let config = TestConfig {
            name: "test".to_string(),
            value: 42,
        };

        write_config_file(&path, &config).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn explicit_path_wins_over_env() {
        let path = resolve_with(
            Some(PathBuf::from("flag.json")),
            Some(PathBuf::from("env.json")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("flag.json"));
    }

    #[test]
    fn env_path_used_without_explicit() {
        let path = resolve_with(None, Some(PathBuf::from("env.json"))).unwrap();
        assert_eq!(path, PathBuf::from("env.json"));
    }

    #[test]
    fn empty_values_fall_through_to_default() {
        // This test may fail in environments without a home directory
        if dirs::config_dir().is_some() {
            let path = resolve_with(Some(PathBuf::new()), Some(PathBuf::new())).unwrap();
            assert!(path.ends_with("bbpr/credentials.json"));
        }
    }
}
