//! Configuration loading and parsing for Heron
//!
//! Provides functionality to load and parse `heron.toml` configuration
//! files. Invalid configuration is the only process-fatal error class;
//! unknown keys produce warnings, not failures.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::confidence::ConfidenceLevel;
use crate::rules::Severity;

pub const CONFIG_FILENAME: &str = "heron.toml";

/// Default ceiling for file discovery; see `[project] max_files`.
pub const DEFAULT_MAX_FILES: usize = 2000;

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["include", "exclude", "rules", "project"];
const KNOWN_RULES_KEYS: &[&str] = &[
    "enabled",
    "disabled",
    "severity",
    "structure",
    "interaction",
    "min_confidence",
];
const KNOWN_PROJECT_KEYS: &[&str] = &["max_files"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub rules: RulesConfig,
    pub project: ProjectConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// File-count ceiling for discovery. Exceeding it stops the scan with
    /// a warning; discovery never truncates silently.
    pub max_files: usize,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
    #[serde(default)]
    pub severity: HashMap<String, SeverityValue>,
    pub structure: Option<bool>,
    pub interaction: Option<bool>,
    pub min_confidence: Option<ConfidenceValue>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SeverityValue {
    Error,
    Warning,
    Info,
}

impl From<SeverityValue> for Severity {
    fn from(value: SeverityValue) -> Self {
        match value {
            SeverityValue::Error => Severity::Error,
            SeverityValue::Warning => Severity::Warning,
            SeverityValue::Info => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceValue {
    High,
    Medium,
    Low,
}

impl From<ConfidenceValue> for ConfidenceLevel {
    fn from(value: ConfidenceValue) -> Self {
        match value {
            ConfidenceValue::High => ConfidenceLevel::High,
            ConfidenceValue::Medium => ConfidenceLevel::Medium,
            ConfidenceValue::Low => ConfidenceLevel::Low,
        }
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    if let Some(toml::Value::Table(rules)) = table.get("rules") {
        let known_rules: HashSet<&str> = KNOWN_RULES_KEYS.iter().copied().collect();
        for key in rules.keys() {
            if !known_rules.contains(key.as_str()) {
                warnings.push(format!("Unknown config option in [rules]: '{}'", key));
            }
        }
    }

    if let Some(toml::Value::Table(project)) = table.get("project") {
        let known_project: HashSet<&str> = KNOWN_PROJECT_KEYS.iter().copied().collect();
        for key in project.keys() {
            if !known_project.contains(key.as_str()) {
                warnings.push(format!("Unknown config option in [project]: '{}'", key));
            }
        }
    }

    warnings
}

pub fn load_config_or_default(start_dir: &Path) -> Config {
    find_config_file(start_dir)
        .and_then(|path| load_config(&path).ok())
        .unwrap_or_default()
}

pub fn load_config_or_default_with_warnings(start_dir: &Path) -> ConfigResult {
    match find_config_file(start_dir) {
        Some(path) => load_config_with_warnings(&path).unwrap_or_default(),
        None => ConfigResult::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn create_temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("Failed to create temp dir")
    }

    #[test]
    fn load_config_from_file() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
include = ["src/**/*.html"]
exclude = ["**/dist/**"]

[rules]
enabled = ["img-alt"]
disabled = ["positive-tabindex"]

[rules.severity]
aria-attr = "error"

[project]
max_files = 500
"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();

        assert_eq!(config.include, vec!["src/**/*.html"]);
        assert_eq!(config.exclude, vec!["**/dist/**"]);
        assert_eq!(config.rules.enabled, vec!["img-alt"]);
        assert_eq!(config.rules.disabled, vec!["positive-tabindex"]);
        assert_eq!(
            config.rules.severity.get("aria-attr"),
            Some(&SeverityValue::Error)
        );
        assert_eq!(config.project.max_files, 500);
    }

    #[test]
    fn default_config_when_missing() {
        let dir = create_temp_dir();
        let config = load_config_or_default(dir.path());

        assert_eq!(config, Config::default());
        assert!(config.include.is_empty());
        assert_eq!(config.project.max_files, DEFAULT_MAX_FILES);
    }

    #[test]
    fn error_on_invalid_toml() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "this is not valid { toml }").unwrap();

        let result = load_config(&config_path);

        assert!(result.is_err());
        match result.unwrap_err() {
            ConfigError::ParseError { path, message } => {
                assert_eq!(path, config_path);
                assert!(!message.is_empty());
            }
            _ => panic!("Expected ParseError"),
        }
    }

    #[test]
    fn find_config_file_walks_up() {
        let dir = create_temp_dir();
        let nested = dir.path().join("src").join("pages");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "include = []").unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILENAME));
    }

    #[test]
    fn unknown_keys_produce_warnings_not_errors() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
include = []
typo_key = true

[rules]
strcture = false
"#,
        )
        .unwrap();

        let result = load_config_with_warnings(&config_path).unwrap();
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("typo_key"));
        assert!(result.warnings[1].contains("strcture"));
    }

    #[test]
    fn min_confidence_parses() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "[rules]\nmin_confidence = \"low\"").unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.rules.min_confidence, Some(ConfidenceValue::Low));
    }
}
