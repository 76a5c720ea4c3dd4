//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Base URL the search probe resolves menu hrefs against
//!
//! ## Optional
//! - `STOREFRONT_DATA_DIR` - Durable storage directory (default: ./.mercadito/data)
//! - `STOREFRONT_SEARCH_DEBOUNCE_MS` - Keystroke debounce delay (default: 450)
//! - `STOREFRONT_SEARCH_RESCAN_DELAY_MS` - Render delay before the fragment rescan (default: 300)
//! - `STOREFRONT_PROBE_TIMEOUT_SECS` - Per-candidate fetch timeout (default: 10)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_DATA_DIR: &str = "./.mercadito/data";
const DEFAULT_DEBOUNCE_MS: u64 = 450;
const DEFAULT_RESCAN_DELAY_MS: u64 = 300;
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Directory backing the durable storage tier
    pub data_dir: PathBuf,
    /// Base URL for resolving menu link hrefs during the remote probe
    pub base_url: Url,
    /// Search engine tuning
    pub search: SearchConfig,
}

/// Search engine tuning.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Delay after the last keystroke before the local match runs
    pub debounce_delay: Duration,
    /// Delay after a marked navigation before the local match re-runs
    pub rescan_delay: Duration,
    /// Per-candidate fetch timeout for the remote probe
    pub probe_timeout: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let data_dir = PathBuf::from(get_env_or_default("STOREFRONT_DATA_DIR", DEFAULT_DATA_DIR));
        let base_url_raw = get_required_env("STOREFRONT_BASE_URL")?;
        let base_url = base_url_raw.parse::<Url>().map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;
        let search = SearchConfig::from_env()?;

        Ok(Self {
            data_dir,
            base_url,
            search,
        })
    }
}

impl SearchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let debounce_ms = get_env_u64("STOREFRONT_SEARCH_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)?;
        let rescan_ms = get_env_u64("STOREFRONT_SEARCH_RESCAN_DELAY_MS", DEFAULT_RESCAN_DELAY_MS)?;
        let timeout_secs = get_env_u64("STOREFRONT_PROBE_TIMEOUT_SECS", DEFAULT_PROBE_TIMEOUT_SECS)?;

        Ok(Self {
            debounce_delay: Duration::from_millis(debounce_ms),
            rescan_delay: Duration::from_millis(rescan_ms),
            probe_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_delay: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            rescan_delay: Duration::from_millis(DEFAULT_RESCAN_DELAY_MS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an integer environment variable with a default value.
fn get_env_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(value) => parse_u64(key, &value),
        Err(_) => Ok(default),
    }
}

/// Parse an integer variable value, reporting the offending key on failure.
fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
