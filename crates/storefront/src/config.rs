//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TAMARIND_API_BASE_URL` - Base URL of the backend REST API
//!
//! ## Optional
//! - `TAMARIND_MEDIA_BASE_URL` - Base URL for relative image references
//!   (default: the API base URL)
//! - `TAMARIND_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `TAMARIND_CATEGORY_PAGE_SIZE` - Categories requested per page (default: 12)
//! - `TAMARIND_CATEGORY_CACHE_TTL_SECS` - Category cache TTL (default: 60)
//! - `TAMARIND_CATEGORY_CACHE_CAPACITY` - Max cached category pages (default: 64)
//! - `TAMARIND_ACCESS_TOKEN` - Pre-seeded bearer token for an existing session
//! - `TAMARIND_CART_FILE` - Path for the locally persisted cart
//! - `TAMARIND_SESSION_FILE` - Path for the locally persisted session
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Sentry event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry trace sample rate (default: 0.1)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend REST API configuration
    pub api: BackendApiConfig,
    /// Base URL used to resolve relative image references
    pub media_base_url: Url,
    /// Path for the locally persisted cart, if any
    pub cart_file: Option<PathBuf>,
    /// Path for the locally persisted session, if any
    pub session_file: Option<PathBuf>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g., production, staging)
    pub sentry_environment: Option<String>,
    /// Sentry event sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry trace sample rate (0.0 - 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Backend REST API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct BackendApiConfig {
    /// Base URL of the backend REST API
    pub base_url: Url,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Categories requested per page
    pub category_page_size: u32,
    /// How long category pages stay cached
    pub category_cache_ttl: Duration,
    /// Maximum number of cached category pages
    pub category_cache_capacity: u64,
    /// Pre-seeded bearer token for an existing session
    pub access_token: Option<SecretString>,
}

impl std::fmt::Debug for BackendApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("category_page_size", &self.category_page_size)
            .field("category_cache_ttl", &self.category_cache_ttl)
            .field("category_cache_capacity", &self.category_cache_capacity)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = BackendApiConfig::from_env()?;

        let media_base_url = match get_optional_env("TAMARIND_MEDIA_BASE_URL") {
            Some(raw) => parse_url("TAMARIND_MEDIA_BASE_URL", &raw)?,
            None => api.base_url.clone(),
        };

        let sentry_sample_rate = parse_sample_rate("SENTRY_SAMPLE_RATE", "1.0")?;
        let sentry_traces_sample_rate = parse_sample_rate("SENTRY_TRACES_SAMPLE_RATE", "0.1")?;

        Ok(Self {
            api,
            media_base_url,
            cart_file: get_optional_env("TAMARIND_CART_FILE").map(PathBuf::from),
            session_file: get_optional_env("TAMARIND_SESSION_FILE").map(PathBuf::from),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }
}

impl BackendApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_url(
            "TAMARIND_API_BASE_URL",
            &get_required_env("TAMARIND_API_BASE_URL")?,
        )?;

        let request_timeout = Duration::from_secs(parse_positive(
            "TAMARIND_REQUEST_TIMEOUT_SECS",
            &get_env_or_default("TAMARIND_REQUEST_TIMEOUT_SECS", "10"),
        )?);

        let category_page_size = u32::try_from(parse_positive(
            "TAMARIND_CATEGORY_PAGE_SIZE",
            &get_env_or_default("TAMARIND_CATEGORY_PAGE_SIZE", "12"),
        )?)
        .map_err(|e| {
            ConfigError::InvalidEnvVar("TAMARIND_CATEGORY_PAGE_SIZE".to_string(), e.to_string())
        })?;

        let category_cache_ttl = Duration::from_secs(parse_positive(
            "TAMARIND_CATEGORY_CACHE_TTL_SECS",
            &get_env_or_default("TAMARIND_CATEGORY_CACHE_TTL_SECS", "60"),
        )?);

        let category_cache_capacity = parse_positive(
            "TAMARIND_CATEGORY_CACHE_CAPACITY",
            &get_env_or_default("TAMARIND_CATEGORY_CACHE_CAPACITY", "64"),
        )?;

        let access_token = get_optional_env("TAMARIND_ACCESS_TOKEN").map(SecretString::from);

        Ok(Self {
            base_url,
            request_timeout,
            category_page_size,
            category_cache_ttl,
            category_cache_capacity,
            access_token,
        })
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

/// Parse a URL-valued variable.
fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a strictly positive integer.
fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    let value = raw
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if value == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(value)
}

/// Parse a sample rate in `0.0..=1.0` from the environment.
fn parse_sample_rate(key: &str, default: &str) -> Result<f32, ConfigError> {
    let raw = get_env_or_default(key, default);
    let value = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {value})"),
        ));
    }
    Ok(value)
}
