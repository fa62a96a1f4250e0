//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Required with the GraphQL backend
//! - `GRAPHQL_ENDPOINT` - Commerce GraphQL endpoint URL
//! - `GRAPHQL_TOKEN` - Bearer token for the endpoint (high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` for voucher
//!   claims (in-memory when unset)
//! - `AUTH_GATEWAY` - `fake` or `graphql` (default: fake)
//! - `CATALOG_SOURCE` - `static` or `graphql` (default: static)
//! - `OTP_FAKE_DELAY_MS` - Artificial latency of the fake gateway (default: 800)
//! - `MEMBER_DISCOUNT_PERCENT` - Discount shown to logged-in customers (default: 5)
//! - `LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

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

/// Which [`AuthGateway`](crate::gateway::AuthGateway) to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayKind {
    Fake,
    Graphql,
}

impl FromStr for GatewayKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fake" => Ok(Self::Fake),
            "graphql" => Ok(Self::Graphql),
            other => Err(format!("expected 'fake' or 'graphql', got '{other}'")),
        }
    }
}

/// Where the catalog comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSourceKind {
    Static,
    Graphql,
}

impl FromStr for CatalogSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "graphql" => Ok(Self::Graphql),
            other => Err(format!("expected 'static' or 'graphql', got '{other}'")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

/// Storefront application configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// `PostgreSQL` connection URL for voucher claims (contains password)
    pub database_url: Option<SecretString>,
    /// Auth gateway implementation
    pub auth_gateway: GatewayKind,
    /// Catalog source implementation
    pub catalog_source: CatalogSourceKind,
    /// GraphQL backend, present when any component uses it
    pub graphql: Option<GraphqlConfig>,
    /// Latency of the fake auth gateway
    pub otp_fake_delay: Duration,
    /// Member discount shown to logged-in customers
    pub member_discount_percent: u8,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Commerce GraphQL backend configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct GraphqlConfig {
    /// Endpoint URL
    pub endpoint: String,
    /// Bearer token
    pub token: SecretString,
}

impl std::fmt::Debug for GraphqlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("auth_gateway", &self.auth_gateway)
            .field("catalog_source", &self.catalog_source)
            .field("graphql", &self.graphql)
            .field("otp_fake_delay", &self.otp_fake_delay)
            .field("member_discount_percent", &self.member_discount_percent)
            .field("log_format", &self.log_format)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
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
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let database_url = get_database_url("STOREFRONT_DATABASE_URL");
        let auth_gateway = parse_env::<GatewayKind>("AUTH_GATEWAY", "fake")?;
        let catalog_source = parse_env::<CatalogSourceKind>("CATALOG_SOURCE", "static")?;
        let graphql = if auth_gateway == GatewayKind::Graphql
            || catalog_source == CatalogSourceKind::Graphql
        {
            Some(GraphqlConfig::from_env()?)
        } else {
            None
        };

        let otp_fake_delay = Duration::from_millis(parse_env::<u64>("OTP_FAKE_DELAY_MS", "800")?);
        let member_discount_percent = parse_env::<u8>("MEMBER_DISCOUNT_PERCENT", "5")?;
        if member_discount_percent > 50 {
            return Err(ConfigError::InvalidEnvVar(
                "MEMBER_DISCOUNT_PERCENT".to_string(),
                "must be at most 50".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            base_url,
            database_url,
            auth_gateway,
            catalog_source,
            graphql,
            otp_fake_delay,
            member_discount_percent,
            log_format: parse_env::<LogFormat>("LOG_FORMAT", "pretty")?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_rate("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_rate("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Configuration for local development and tests.
    #[must_use]
    pub fn local() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            database_url: None,
            auth_gateway: GatewayKind::Fake,
            catalog_source: CatalogSourceKind::Static,
            graphql: None,
            otp_fake_delay: Duration::ZERO,
            member_discount_percent: 5,
            log_format: LogFormat::Pretty,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl GraphqlConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = get_required_env("GRAPHQL_ENDPOINT")?;
        let url = Url::parse(&endpoint).map_err(|e| {
            ConfigError::InvalidEnvVar("GRAPHQL_ENDPOINT".to_string(), e.to_string())
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "GRAPHQL_ENDPOINT".to_string(),
                "must be an http(s) URL".to_string(),
            ));
        }

        Ok(Self {
            endpoint,
            token: get_validated_secret("GRAPHQL_TOKEN")?,
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

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a sample rate in `0.0..=1.0`.
fn parse_rate(key: &str, default: &str) -> Result<f32, ConfigError> {
    let rate = parse_env::<f32>(key, default)?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ))
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
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real tokens are random; dictionary words are not
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-graphql-token", "GRAPHQL_TOKEN");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
        assert!(validate_secret_strength("changeme123", "GRAPHQL_TOKEN").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "GRAPHQL_TOKEN");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "GRAPHQL_TOKEN");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!("fake".parse::<GatewayKind>().unwrap(), GatewayKind::Fake);
        assert_eq!(" GraphQL ".parse::<GatewayKind>().unwrap(), GatewayKind::Graphql);
        assert!("rest".parse::<GatewayKind>().is_err());
        assert_eq!(
            "static".parse::<CatalogSourceKind>().unwrap(),
            CatalogSourceKind::Static
        );
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig::local();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_https());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = StorefrontConfig {
            database_url: Some(SecretString::from("postgres://optica:hunter2@db/optica")),
            graphql: Some(GraphqlConfig {
                endpoint: "https://api.optica.vn/graphql".to_string(),
                token: SecretString::from("tok_9fK2xQ7mLp3Zr8Vb"),
            }),
            ..StorefrontConfig::local()
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("https://api.optica.vn/graphql"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains("tok_9fK2xQ7mLp3Zr8Vb"));
    }
}
