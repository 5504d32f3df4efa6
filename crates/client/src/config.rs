//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AUTONORTE_API_BASE` - Base URL of the storefront backend
//!   (e.g., `https://tienda.autonorte.cl`)
//!
//! ## Optional
//! - `AUTONORTE_STATE_FILE` - Path of the JSON file holding the session
//!   token and guest cart (default: in-memory only)
//! - `AUTONORTE_TIMEOUT_SECS` - HTTP request timeout in seconds
//!   (default: 30)
//! - `AUTONORTE_LOGIN_PATH` - Path the login redirect hook should point
//!   at (default: `/login/`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

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
pub struct StoreConfig {
    /// Base URL of the backend, without a trailing slash.
    pub api_base: String,
    /// Where the credential store persists; `None` keeps state in memory.
    pub state_file: Option<PathBuf>,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Login page path used when building redirect targets.
    pub login_path: String,
}

impl StoreConfig {
    /// Create a configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            api_base,
            state_file: None,
            timeout: Duration::from_secs(30),
            login_path: "/login/".to_string(),
        }
    }

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

        let api_base = get_required_env("AUTONORTE_API_BASE")?;
        // Parse for validation only; endpoints are built by string
        // formatting against the trimmed base.
        Url::parse(&api_base).map_err(|e| {
            ConfigError::InvalidEnvVar("AUTONORTE_API_BASE".to_string(), e.to_string())
        })?;

        let state_file = get_optional_env("AUTONORTE_STATE_FILE").map(PathBuf::from);

        let timeout_secs = get_env_or_default("AUTONORTE_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("AUTONORTE_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let login_path = get_env_or_default("AUTONORTE_LOGIN_PATH", "/login/");

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            state_file,
            timeout: Duration::from_secs(timeout_secs),
            login_path,
        })
    }

    /// Full URL of the login page.
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}{}", self.api_base, self.login_path)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = StoreConfig::new("https://tienda.autonorte.cl/");
        assert_eq!(config.api_base, "https://tienda.autonorte.cl");
        assert_eq!(config.login_url(), "https://tienda.autonorte.cl/login/");
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::new("http://localhost:8000");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.state_file.is_none());
        assert_eq!(config.login_path, "/login/");
    }
}
