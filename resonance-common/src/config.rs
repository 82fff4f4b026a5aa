//! Bootstrap configuration loading
//!
//! Resolution order for every setting:
//! 1. Command-line arguments (handled by the binary)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants below)
//!
//! A missing TOML file is not an error: a warning is logged and defaults are
//! used. A TOML file that exists but cannot be parsed is a configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default HTTP port for the playlist generator
pub const DEFAULT_PORT: u16 = 5730;

/// Default generative model
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Default generative service endpoint (model name and `:generateContent` are appended)
pub const DEFAULT_GENERATION_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models";

/// Default catalog client-credentials endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Default catalog search endpoint
pub const DEFAULT_SEARCH_URL: &str = "https://api.spotify.com/v1/search";

/// Environment variable holding the generative service API key
pub const ENV_GENERATION_API_KEY: &str = "GEMINI_API_KEY";

/// Environment variable holding the catalog client id
pub const ENV_CATALOG_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";

/// Environment variable holding the catalog client secret
pub const ENV_CATALOG_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";

/// Bootstrap configuration loaded from TOML
///
/// Every field has a built-in default so an empty file (or no file) is valid.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Generative service settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Music catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            logging: LoggingConfig::default(),
            generation: GenerationConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Generative service settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// API key (overridden by `GEMINI_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the model endpoints
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    /// Number of songs requested from the service
    #[serde(default = "default_song_count")]
    pub song_count: usize,

    /// Deadline for one generative call, in milliseconds
    #[serde(default = "default_generation_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound of any single backoff, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_generation_base_url(),
            song_count: default_song_count(),
            timeout_ms: default_generation_timeout_ms(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Music catalog settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Client id (overridden by `SPOTIFY_CLIENT_ID`)
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret (overridden by `SPOTIFY_CLIENT_SECRET`)
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Client-credentials token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Track search endpoint
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Deadline for one token exchange, in milliseconds
    #[serde(default = "default_token_timeout_ms")]
    pub token_timeout_ms: u64,

    /// Deadline for one search request, in milliseconds
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,
}

impl CatalogConfig {
    pub fn token_timeout(&self) -> Duration {
        Duration::from_millis(self.token_timeout_ms)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: default_token_url(),
            search_url: default_search_url(),
            token_timeout_ms: default_token_timeout_ms(),
            search_timeout_ms: default_search_timeout_ms(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_generation_base_url() -> String {
    DEFAULT_GENERATION_BASE_URL.to_string()
}

fn default_song_count() -> usize {
    10
}

fn default_generation_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.to_string()
}

fn default_token_timeout_ms() -> u64 {
    5_000
}

fn default_search_timeout_ms() -> u64 {
    10_000
}

/// Platform default config file: `<config_dir>/resonance/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("resonance").join("config.toml"))
}

/// Parse TOML configuration text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load TOML configuration
///
/// Uses `explicit_path` when given, otherwise the platform default path.
/// Falls back to built-in defaults when no file exists.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => {
                warn!("Could not determine config directory, using built-in defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    if !path.exists() {
        warn!(
            "Config file not found at {}, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config = parse_toml_config(&content)?;

    info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// Resolve a secret from environment, then TOML
///
/// Blank values count as absent. A warning is logged when both sources
/// carry a value; the environment wins.
pub fn resolve_secret(label: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment ({}) and TOML config. Using environment.",
            label, env_var
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", label);
        return Some(value);
    }

    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", label);
        return Some(value.to_string());
    }

    warn!("{} not configured (set {} or the TOML config)", label, env_var);
    None
}

/// Validate a key or secret (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
