//! Accounts service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `APPWRITE_ENDPOINT` - Appwrite API endpoint (e.g., `https://cloud.appwrite.io/v1`)
//! - `APPWRITE_PROJECT_ID` - Appwrite project ID
//! - `APPWRITE_API_KEY` - Server API key (needs `documents.*` and `sessions.write` scopes)
//! - `APPWRITE_DATABASE_ID` - Database holding the users collection
//! - `APPWRITE_USERS_COLLECTION_ID` - Collection holding user records
//!
//! ## Optional
//! - `ACCOUNTS_HOST` - Bind address (default: 127.0.0.1)
//! - `ACCOUNTS_PORT` - Listen port (default: 3000)
//! - `APPWRITE_TIMEOUT_SECS` - Per-request timeout for Appwrite calls (default: 10)
//! - `DIRECTORY_BACKEND` - `appwrite` (default), `postgres` or `memory`
//! - `ACCOUNTS_DATABASE_URL` - `PostgreSQL` connection string (required for `postgres`)
//! - `DEFAULT_AVATAR_URL` - Override the built-in placeholder avatar
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `json` for JSON log lines (read by the server binary)
//! - `RUST_LOG` - Log filter (default: `stashbox_accounts=info,tower_http=debug`)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use stashbox_core::Avatar;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
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

/// Where user records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectoryBackend {
    /// Appwrite Databases collection (the production store).
    #[default]
    Appwrite,
    /// Local `PostgreSQL` table with a unique index on email.
    Postgres,
    /// Process-local map, for development only.
    Memory,
}

impl FromStr for DirectoryBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "appwrite" => Ok(Self::Appwrite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "unknown backend '{other}' (expected appwrite, postgres or memory)"
            )),
        }
    }
}

/// Accounts service configuration.
#[derive(Debug, Clone)]
pub struct AccountsConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Appwrite API configuration
    pub appwrite: AppwriteConfig,
    /// Which directory backend stores user records
    pub directory_backend: DirectoryBackend,
    /// `PostgreSQL` database connection URL (only for the postgres backend)
    pub database_url: Option<SecretString>,
    /// Avatar assigned to newly created user records
    pub default_avatar: Avatar,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., production, staging)
    pub sentry_environment: Option<String>,
}

/// Appwrite API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AppwriteConfig {
    /// API endpoint including the version path (e.g., `https://cloud.appwrite.io/v1`)
    pub endpoint: String,
    /// Project ID sent as `X-Appwrite-Project`
    pub project_id: String,
    /// Server API key sent as `X-Appwrite-Key`
    pub api_key: SecretString,
    /// Database holding the users collection
    pub database_id: String,
    /// Collection holding user records
    pub users_collection_id: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for AppwriteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppwriteConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .field("database_id", &self.database_id)
            .field("users_collection_id", &self.users_collection_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AccountsConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("ACCOUNTS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ACCOUNTS_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ACCOUNTS_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ACCOUNTS_PORT".to_string(), e.to_string()))?;

        let appwrite = AppwriteConfig::from_env()?;

        let directory_backend = get_env_or_default("DIRECTORY_BACKEND", "appwrite")
            .parse::<DirectoryBackend>()
            .map_err(|e| ConfigError::InvalidEnvVar("DIRECTORY_BACKEND".to_string(), e))?;

        let database_url = get_database_url("ACCOUNTS_DATABASE_URL");
        if directory_backend == DirectoryBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "ACCOUNTS_DATABASE_URL".to_string(),
            ));
        }

        let default_avatar = match get_optional_env("DEFAULT_AVATAR_URL") {
            Some(url) => Avatar::parse(&url).map_err(|e| {
                ConfigError::InvalidEnvVar("DEFAULT_AVATAR_URL".to_string(), e.to_string())
            })?,
            None => Avatar::default(),
        };

        Ok(Self {
            host,
            port,
            appwrite,
            directory_backend,
            database_url,
            default_avatar,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AppwriteConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = get_required_env("APPWRITE_ENDPOINT")?;
        url::Url::parse(&endpoint).map_err(|e| {
            ConfigError::InvalidEnvVar("APPWRITE_ENDPOINT".to_string(), e.to_string())
        })?;

        let timeout_secs = get_env_or_default("APPWRITE_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "APPWRITE_TIMEOUT_SECS".to_string(),
                    "must be a positive number of seconds".to_string(),
                )
            })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: get_required_env("APPWRITE_PROJECT_ID")?,
            api_key: get_validated_secret("APPWRITE_API_KEY")?,
            database_id: get_required_env("APPWRITE_DATABASE_ID")?,
            users_collection_id: get_required_env("APPWRITE_USERS_COLLECTION_ID")?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Build a configuration pointing at `endpoint`, with defaults for the rest.
    ///
    /// Used by tests that stand up a mock Appwrite server.
    #[must_use]
    pub fn for_endpoint(endpoint: &str, api_key: SecretString) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: "stashbox".to_string(),
            api_key,
            database_id: "main".to_string(),
            users_collection_id: "users".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
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

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
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

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key generated by the Appwrite console."
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
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-appwrite-key", "APPWRITE_API_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"a".repeat(64), "APPWRITE_API_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength(
            "standard_9f3a1c7be04d26a85f1e3b9c70d4a2e6b8f01c35d7e9a24b6",
            "APPWRITE_API_KEY",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_directory_backend_parse() {
        assert_eq!(
            "appwrite".parse::<DirectoryBackend>().unwrap(),
            DirectoryBackend::Appwrite
        );
        assert_eq!(
            " Postgres ".parse::<DirectoryBackend>().unwrap(),
            DirectoryBackend::Postgres
        );
        assert_eq!(
            "memory".parse::<DirectoryBackend>().unwrap(),
            DirectoryBackend::Memory
        );
        assert!("mongo".parse::<DirectoryBackend>().is_err());
    }

    #[test]
    fn test_for_endpoint_trims_trailing_slash() {
        let config =
            AppwriteConfig::for_endpoint("http://127.0.0.1:9000/v1/", SecretString::from("k"));
        assert_eq!(config.endpoint, "http://127.0.0.1:9000/v1");
        assert_eq!(config.api_key.expose_secret(), "k");
    }

    #[test]
    fn test_appwrite_config_debug_redacts_key() {
        let config = AppwriteConfig::for_endpoint(
            "http://localhost/v1",
            SecretString::from("super_secret_api_key_value"),
        );

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("http://localhost/v1"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_api_key_value"));
    }
}
