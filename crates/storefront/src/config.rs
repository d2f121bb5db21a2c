//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ALGHAZALY_API_URL` - Base URL of the backend (e.g., `https://api.alghazaly.com`)
//! - `ALGHAZALY_SESSION_TOKEN` - Customer session token (bearer, high entropy)
//!
//! ## Optional
//! - `ALGHAZALY_LOCALE` - `en` or `ar` (default: en)
//! - `ALGHAZALY_CART_STALE_SECS` - Cart freshness window (default: 30)
//! - `ALGHAZALY_FAVORITES_STALE_SECS` - Favorites freshness window (default: 60)
//! - `ALGHAZALY_ORDERS_STALE_SECS` - Orders freshness window (default: 120)
//! - `ALGHAZALY_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 15)
//! - `ALGHAZALY_SHIPPING_COST` - Flat shipping cost in EGP (default: 150)
//! - `ALGHAZALY_CACHE_CAPACITY` - Maximum cached resources (default: 256)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::time::Duration;

use alghazaly_core::Locale;
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_SESSION_TOKEN_LENGTH: usize = 16;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Cache freshness and capacity
    pub cache: CacheConfig,
    /// Locale used for user-facing notices
    pub locale: Locale,
    /// Flat shipping cost added to order summaries
    pub shipping_cost: Decimal,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Backend API configuration.
///
/// Implements `Debug` manually to redact the session token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL of the backend, without the `/api` prefix
    pub base_url: Url,
    /// Customer session token sent as a bearer token
    pub session_token: SecretString,
    /// Timeout applied to every request
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("session_token", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// How long each resource stays fresh, and how many resources are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Freshness window for the cart
    pub cart_stale_after: Duration,
    /// Freshness window for favorites
    pub favorites_stale_after: Duration,
    /// Freshness window for orders
    pub orders_stale_after: Duration,
    /// Maximum number of cached resources
    pub capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cart_stale_after: Duration::from_secs(30),
            favorites_stale_after: Duration::from_secs(60),
            orders_stale_after: Duration::from_secs(120),
            capacity: 256,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the session token fails validation (placeholder detection, entropy
    /// check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig::from_env()?;
        let cache = CacheConfig::from_env()?;
        let locale = get_env_or_default("ALGHAZALY_LOCALE", "en")
            .parse::<Locale>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ALGHAZALY_LOCALE".to_string(), e.to_string())
            })?;
        let shipping_cost = get_env_or_default("ALGHAZALY_SHIPPING_COST", "150")
            .parse::<Decimal>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ALGHAZALY_SHIPPING_COST".to_string(), e.to_string())
            })?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api,
            cache,
            locale,
            shipping_cost,
            sentry_dsn,
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("ALGHAZALY_API_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ALGHAZALY_API_URL".to_string(), e.to_string())
            })?;
        let session_token = get_validated_secret("ALGHAZALY_SESSION_TOKEN")?;
        let request_timeout = get_duration_secs("ALGHAZALY_REQUEST_TIMEOUT_SECS", 15)?;

        Ok(Self {
            base_url,
            session_token,
            request_timeout,
        })
    }
}

impl CacheConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            cart_stale_after: get_duration_secs(
                "ALGHAZALY_CART_STALE_SECS",
                defaults.cart_stale_after.as_secs(),
            )?,
            favorites_stale_after: get_duration_secs(
                "ALGHAZALY_FAVORITES_STALE_SECS",
                defaults.favorites_stale_after.as_secs(),
            )?,
            orders_stale_after: get_duration_secs(
                "ALGHAZALY_ORDERS_STALE_SECS",
                defaults.orders_stale_after.as_secs(),
            )?,
            capacity: get_env_or_default("ALGHAZALY_CACHE_CAPACITY", "256")
                .parse::<u64>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "ALGHAZALY_CACHE_CAPACITY".to_string(),
                        e.to_string(),
                    )
                })?,
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

/// Get a whole number of seconds as a `Duration`.
fn get_duration_secs(key: &str, default: u64) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is long enough, not a placeholder, and has
/// sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SESSION_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_TOKEN_LENGTH,
                secret.len()
            ),
        ));
    }

    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real session tokens are random; low entropy means a hand-typed value
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the token issued at login."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
