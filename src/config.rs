//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain (e.g., "clips.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://clips.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Storage configuration (R2/S3-compatible blob store)
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket name for media
    pub bucket: String,
    /// Public URL for media (Custom Domain)
    /// e.g., "https://media.example.com"
    pub public_url: String,
    /// Cloudflare account ID
    pub account_id: String,
    /// R2 access key ID
    pub access_key_id: String,
    /// R2 secret access key
    pub secret_access_key: String,
}

/// Token signing configuration
///
/// Access tokens are short-lived and verified statelessly; refresh
/// tokens are long-lived, stored on the user record and rotated on
/// every use. The two kinds are signed with independent secrets.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Access-token signing secret (32+ bytes)
    pub access_token_secret: String,
    /// Access-token lifetime in seconds (default: 900 = 15 min)
    pub access_token_ttl: i64,
    /// Refresh-token signing secret (32+ bytes)
    pub refresh_token_secret: String,
    /// Refresh-token lifetime in seconds (default: 864000 = 10 days)
    pub refresh_token_ttl: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (CLIPSTREAM_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.protocol", "http")?
            .set_default("auth.access_token_ttl", 900)?
            .set_default("auth.refresh_token_ttl", 864000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (CLIPSTREAM_*)
            .add_source(
                Environment::with_prefix("CLIPSTREAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_TOKEN_SECRET_BYTES: usize = 32;

        for (name, secret) in [
            ("auth.access_token_secret", &self.auth.access_token_secret),
            ("auth.refresh_token_secret", &self.auth.refresh_token_secret),
        ] {
            if secret.as_bytes().len() < MIN_TOKEN_SECRET_BYTES {
                return Err(crate::error::AppError::Config(format!(
                    "{} must be at least {} bytes",
                    name, MIN_TOKEN_SECRET_BYTES
                )));
            }
        }

        if self.auth.access_token_ttl <= 0 || self.auth.refresh_token_ttl <= 0 {
            return Err(crate::error::AppError::Config(
                "token TTLs must be positive".to_string(),
            ));
        }

        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            return Err(crate::error::AppError::Config(
                "access and refresh token secrets must differ".to_string(),
            ));
        }

        Ok(())
    }
}
