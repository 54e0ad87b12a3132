use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::language_utils;

/// Application configuration module
/// This module handles loading, validating and saving configuration settings.
/// Constructed once per run and handed to the controller; nothing here is global.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code sent to the API (e.g. "zh", "en")
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Name of the input column holding the text to translate.
    /// Empty means "derive from the source language".
    #[serde(default)]
    pub text_column: String,

    /// Target language codes, in selection order
    #[serde(default = "language_utils::all_target_codes")]
    pub target_languages: Vec<String>,

    /// Translation API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Dispatch limits
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,

    /// Codes to substitute when talking to the provider (target code -> provider code)
    #[serde(default)]
    pub target_code_overrides: BTreeMap<String, String>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation API endpoint and credentials
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    /// Service endpoint URL
    #[serde(default)]
    pub endpoint: String,

    /// Bearer token
    #[serde(default)]
    pub api_key: String,

    /// User tag sent with every request
    #[serde(default = "default_api_user")]
    pub user: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            user: default_api_user(),
        }
    }
}

/// Concurrency, timeout and spacing settings for one batch
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConcurrencyConfig {
    /// Maximum number of in-flight translation calls
    #[serde(default = "default_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Upper bound for a single call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Minimum gap between two outgoing calls, in milliseconds
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_concurrent_requests(),
            request_timeout_secs: default_timeout_secs(),
            min_request_interval_ms: default_min_request_interval_ms(),
        }
    }
}

impl ConcurrencyConfig {
    /// Per-call timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Request spacing as a Duration
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the log facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "zh".to_string()
}

fn default_api_user() -> String {
    "sheetglot".to_string()
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_min_request_interval_ms() -> u64 {
    100
}

/// Default text column for the built-in source languages
pub fn default_text_column(source_language: &str) -> Option<&'static str> {
    match source_language.trim().to_lowercase().as_str() {
        "zh" => Some("中文"),
        "en" => Some("英文"),
        _ => None,
    }
}

impl Config {
    /// Load a configuration file, writing a default one when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;
        Ok(config)
    }

    /// Text column to read, falling back to the source language default
    pub fn effective_text_column(&self) -> Option<String> {
        if !self.text_column.trim().is_empty() {
            return Some(self.text_column.clone());
        }
        default_text_column(&self.source_language).map(str::to_string)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_source_code(&self.source_language)?;

        if self.effective_text_column().is_none() {
            return Err(anyhow!(
                "No text column configured and no default exists for source language '{}'",
                self.source_language
            ));
        }

        if self.target_languages.is_empty() {
            return Err(anyhow!("At least one target language must be selected"));
        }

        for code in &self.target_languages {
            if !language_utils::is_supported_target(code) {
                return Err(anyhow!("Unsupported target language code: {}", code));
            }
        }

        for code in self.target_code_overrides.keys() {
            if !language_utils::is_supported_target(code) {
                return Err(anyhow!("Override for unsupported target language code: {}", code));
            }
        }

        if self.api.endpoint.trim().is_empty() {
            return Err(anyhow!("Translation API endpoint is required"));
        }

        if self.api.api_key.trim().is_empty() {
            return Err(anyhow!("Translation API key is required"));
        }

        if self.concurrency.max_concurrent_requests == 0 {
            return Err(anyhow!("max_concurrent_requests must be at least 1"));
        }

        if self.concurrency.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be at least 1"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            text_column: String::new(),
            target_languages: language_utils::all_target_codes(),
            api: ApiConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            target_code_overrides: BTreeMap::new(),
            log_level: LogLevel::default(),
        }
    }
}
