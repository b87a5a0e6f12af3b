//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STORECART_API_URL` - Base URL of the product/stock API
//!
//! ## Optional
//! - `STORECART_API_TOKEN` - Bearer token sent to the product/stock API
//! - `STORECART_STORAGE_KEY` - Key the cart is stored under (default: `@storecart:cart`)
//! - `STORECART_STORE_PATH` - JSON file backing the durable store (default: `storecart.json`)
//! - `STORECART_PRODUCT_CACHE_TTL_SECS` - Product attribute cache TTL, `0` disables (default: 300)
//! - `STORECART_HTTP_TIMEOUT_SECS` - Per-request timeout for the API (default: none)
//! - `STORECART_LOG_JSON` - Emit JSON logs when set to `1` or `true`
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default key the cart is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "@storecart:cart";

/// Default path of the JSON file store.
pub const DEFAULT_STORE_PATH: &str = "storecart.json";

const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Product/stock API configuration
    pub api: ApiConfig,
    /// Key the cart snapshot is stored under
    pub storage_key: String,
    /// Path of the JSON file store
    pub store_path: PathBuf,
    /// Emit JSON formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Product/stock API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL, always ending in `/`
    pub base_url: Url,
    /// Bearer token, if the API requires one
    pub token: Option<SecretString>,
    /// How long product attributes are cached (zero disables caching)
    pub product_cache_ttl: Duration,
    /// Per-request timeout
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("product_cache_ttl", &self.product_cache_ttl)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiConfig {
    /// API configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            token: None,
            product_cache_ttl: Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS),
            timeout: None,
        }
    }
}

impl CartConfig {
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

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(get);

        let base_url = vars.required("STORECART_API_URL")?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STORECART_API_URL".to_string(), e.to_string())
        })?;

        let api = ApiConfig {
            token: vars.optional("STORECART_API_TOKEN").map(SecretString::from),
            product_cache_ttl: Duration::from_secs(
                vars.parsed("STORECART_PRODUCT_CACHE_TTL_SECS")?
                    .unwrap_or(DEFAULT_PRODUCT_CACHE_TTL_SECS),
            ),
            timeout: vars
                .parsed::<u64>("STORECART_HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            ..ApiConfig::new(base_url)
        };

        Ok(Self {
            api,
            storage_key: vars.or_default("STORECART_STORAGE_KEY", DEFAULT_STORAGE_KEY),
            store_path: PathBuf::from(vars.or_default("STORECART_STORE_PATH", DEFAULT_STORE_PATH)),
            log_json: vars
                .optional("STORECART_LOG_JSON")
                .is_some_and(|v| matches!(v.as_str(), "1" | "true")),
            sentry_dsn: vars.optional("SENTRY_DSN"),
        })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .map(|v| {
                v.trim()
                    .parse::<T>()
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
            })
            .transpose()
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
