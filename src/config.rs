use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dates::parse_timestamp;
use crate::error::ConfigError;

/// How CLI commands print their results.
#[derive(Serialize, Deserialize, ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// User settings. Every field has a default, so a partial file is fine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub format: OutputFormat,
    /// Tracing filter used when `TASKWISE_LOG` is not set.
    pub log_filter: String,
    /// Fixed reference instant for relative dates, ISO 8601.
    pub reference_time: Option<String>,
    /// Use the built-in lexicon annotator; when off, extraction is pattern-only.
    pub builtin_annotator: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            log_filter: "warn".to_string(),
            reference_time: None,
            builtin_annotator: true,
        }
    }
}

/// Returns the path to the configuration file.
///
/// The path is determined in the following order:
/// 1. `TASKWISE_CONFIG` environment variable.
/// 2. `~/.config/taskwise/config.json` (on Linux).
/// 3. `./config.json` (fallback).
pub fn config_path() -> PathBuf {
    std::env::var("TASKWISE_CONFIG").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("taskwise");
        p.push("config.json");
        p
    })
}

impl Config {
    /// Loads the config file at [`config_path`].
    ///
    /// # Returns
    /// Defaults when the file does not exist, an error when it cannot be read
    /// or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&data)?)
    }

    /// The configured reference instant. `TASKWISE_NOW` takes precedence over
    /// the file; an unparsable value is logged and ignored.
    pub fn reference_time(&self) -> Option<NaiveDateTime> {
        let raw = std::env::var("TASKWISE_NOW").ok().or_else(|| self.reference_time.clone())?;
        let parsed = parse_timestamp(&raw);
        if parsed.is_none() {
            warn!(value = %raw, "ignoring malformed reference time");
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("taskwise_config_{}_{}.json", name, std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("taskwise_config_does_not_exist.json");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let path = temp_file("partial", r#"{"format": "json", "builtin_annotator": false}"#);
        let config = Config::load_from(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert!(!config.builtin_annotator);
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = temp_file("broken", "{format: json");
        let result = Config::load_from(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
