//! Configuration: CLI flags, environment, and an optional JSON config file.
//!
//! Precedence for the API key and model, highest first:
//! 1. CLI flag
//! 2. `SCRIBE_API_KEY` / `SCRIBE_MODEL`
//! 3. Config file
//! 4. Legacy `GEMINI_API_KEY` / `GEMINI_MODEL`
//! 5. Built-in default (model only)

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::commit::PrefixFormat;
use crate::error::ConfigError;
use crate::llm::DEFAULT_BASE_URL;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub const API_KEY_ENV: &str = "SCRIBE_API_KEY";
pub const MODEL_ENV: &str = "SCRIBE_MODEL";
pub const LEGACY_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const LEGACY_MODEL_ENV: &str = "GEMINI_MODEL";
/// Explicit config file path, checked before the standard locations.
pub const CONFIG_PATH_ENV: &str = "SCRIBE_CONFIG";
pub const BASE_URL_ENV: &str = "SCRIBE_BASE_URL";

const CONFIG_DIR_NAME: &str = "scribe";
const CONFIG_FILE_NAME: &str = "config.json";
const HOME_CONFIG_FILE_NAME: &str = ".scribe.json";

const KNOWN_KEYS: &[&str] = &["apiKey", "model", "prefixFormat", "autoPrefixFromBranch"];

/// Contents of a config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_format: Option<PrefixFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_prefix_from_branch: Option<bool>,
}

impl FileConfig {
    /// Starting point written by `--init-config`.
    pub fn template() -> Self {
        Self {
            api_key: Some(String::new()),
            model: Some(DEFAULT_MODEL.to_string()),
            prefix_format: Some(PrefixFormat::default()),
            auto_prefix_from_branch: Some(true),
        }
    }
}

/// A config file that was found and parsed.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub config: FileConfig,
}

/// Settings supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    /// `--no-auto-prefix`
    pub disable_auto_prefix: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub prefix_format: PrefixFormat,
    pub auto_prefix_from_branch: bool,
    pub base_url: String,
    /// Config file the settings were read from, if any.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    /// Discover the config file and resolve all settings.
    pub fn load(overrides: &CliOverrides) -> Self {
        let file = load_file_config(&candidate_paths());
        Self::resolve(overrides, file)
    }

    /// Apply the precedence rules to an already-loaded config file.
    pub fn resolve(overrides: &CliOverrides, file: Option<LoadedFile>) -> Self {
        let (source, file) = match file {
            Some(loaded) => (Some(loaded.path), loaded.config),
            None => (None, FileConfig::default()),
        };

        let api_key = non_empty(overrides.api_key.clone())
            .or_else(|| env_value(API_KEY_ENV))
            .or_else(|| non_empty(file.api_key))
            .or_else(|| env_value(LEGACY_API_KEY_ENV));

        let model = non_empty(overrides.model.clone())
            .or_else(|| env_value(MODEL_ENV))
            .or_else(|| non_empty(file.model))
            .or_else(|| env_value(LEGACY_MODEL_ENV))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let auto_prefix_from_branch =
            !overrides.disable_auto_prefix && file.auto_prefix_from_branch.unwrap_or(true);

        Self {
            api_key,
            model,
            prefix_format: file.prefix_format.unwrap_or_default(),
            auto_prefix_from_branch,
            base_url: env_value(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            source,
        }
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }
}

/// Config file locations in lookup order.
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(explicit) = env_value(CONFIG_PATH_ENV) {
        paths.push(PathBuf::from(explicit));
    }
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(HOME_CONFIG_FILE_NAME));
    }
    paths
}

/// Where `--init-config` writes: `$SCRIBE_CONFIG` if set, else the platform config dir.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(explicit) = env_value(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(explicit));
    }
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoConfigDirectory)
}

/// Return the first candidate that exists and parses.
///
/// Unreadable or malformed files are reported and skipped.
pub fn load_file_config(candidates: &[PathBuf]) -> Option<LoadedFile> {
    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match parse_config_file(path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                return Some(LoadedFile {
                    path: path.clone(),
                    config,
                });
            }
            Err(e) => warn!("Skipping config file: {e}"),
        }
    }
    None
}

/// Parse one config file, warning about keys scribe does not recognise.
pub fn parse_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let shown = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: shown.clone(),
        source,
    })?;

    let value: serde_json::Value =
        serde_json::from_str(&contents).map_err(|e| ConfigError::Malformed {
            path: shown.clone(),
            message: e.to_string(),
        })?;

    let Some(object) = value.as_object() else {
        return Err(ConfigError::Malformed {
            path: shown,
            message: "expected a JSON object".to_string(),
        });
    };

    for key in unknown_keys(object) {
        warn!("Unknown key '{}' in config file {}", key, shown);
    }

    serde_json::from_value(value).map_err(|e| ConfigError::Malformed {
        path: shown,
        message: e.to_string(),
    })
}

/// Keys in a config object that scribe ignores.
fn unknown_keys(object: &serde_json::Map<String, serde_json::Value>) -> Vec<&str> {
    object
        .keys()
        .map(String::as_str)
        .filter(|k| !KNOWN_KEYS.contains(k))
        .collect()
}

/// Write the template config to `path`, creating parent directories.
pub fn write_template(path: &Path) -> Result<(), ConfigError> {
    let write_failed = |source| ConfigError::WriteFailed {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_failed)?;
    }

    let mut data = serde_json::to_string_pretty(&FileConfig::template())
        .map_err(|e| write_failed(std::io::Error::other(e)))?;
    data.push('\n');

    std::fs::write(path, data).map_err(write_failed)
}

fn env_value(name: &str) -> Option<String> {
    non_empty(env::var(name).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
