//! Configuration loading and parsing for Shaker
//!
//! Provides functionality to load and parse `shaker.toml` configuration
//! files.

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const CONFIG_FILENAME: &str = "shaker.toml";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["include", "exclude", "roots", "analysis"];
const KNOWN_ROOTS_KEYS: &[&str] = &["entries"];
const KNOWN_ANALYSIS_KEYS: &[&str] = &["var_init_flow"];

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
    pub roots: RootsConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RootsConfig {
    /// Binding names treated as reachability roots. When empty, exported
    /// names are used, and failing that every top-level binding.
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Connect `var x = init` initializer values into the variable node.
    pub var_init_flow: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            var_init_flow: true,
        }
    }
}

/// Walk up from `start_dir` looking for a `shaker.toml`.
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

pub fn load_config(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(&content, path)
}

pub fn parse_config(content: &str, path: &Path) -> Result<ConfigResult, ConfigError> {
    let value: toml::Value = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = collect_unknown_key_warnings(&value);

    let config: Config = value.try_into().map_err(|e: toml::de::Error| {
        ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    Ok(ConfigResult { config, warnings })
}

fn collect_unknown_key_warnings(value: &toml::Value) -> Vec<String> {
    let mut warnings = Vec::new();

    let Some(table) = value.as_table() else {
        return warnings;
    };

    for key in table.keys() {
        if !KNOWN_TOP_LEVEL_KEYS.contains(&key.as_str()) {
            warnings.push(format!("Unknown configuration key '{key}'"));
        }
    }
    warn_unknown_section_keys(table, "roots", KNOWN_ROOTS_KEYS, &mut warnings);
    warn_unknown_section_keys(table, "analysis", KNOWN_ANALYSIS_KEYS, &mut warnings);

    warnings
}

fn warn_unknown_section_keys(
    table: &toml::map::Map<String, toml::Value>,
    section: &str,
    known: &[&str],
    warnings: &mut Vec<String>,
) {
    if let Some(section_table) = table.get(section).and_then(|v| v.as_table()) {
        for key in section_table.keys() {
            if !known.contains(&key.as_str()) {
                warnings.push(format!("Unknown configuration key '{section}.{key}'"));
            }
        }
    }
}
