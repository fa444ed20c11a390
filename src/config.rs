//! Configuration module for Folo-Lite.

use serde::Deserialize;
use std::path::Path;

use crate::{FoloError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (`sqlite://...` or `postgres://...`).
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Maximum pooled connections.
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
}

fn default_db_url() -> String {
    "sqlite://data/folo.db".to_string()
}

fn default_db_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_db_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/folo.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Feed fetching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Maximum article content length in characters.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
    /// User agent sent with feed requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Allow loopback and private network hosts (tests, intranet feeds).
    #[serde(default)]
    pub allow_private_hosts: bool,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    20
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_max_content_length() -> usize {
    100_000
}

fn default_user_agent() -> String {
    "Folo-Lite/0.1 (Feed Reader)".to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            max_feed_size_bytes: default_max_feed_size(),
            max_content_length: default_max_content_length(),
            user_agent: default_user_agent(),
            allow_private_hosts: false,
        }
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Retries for connection-class persistence failures.
    #[serde(default = "default_persistence_retries")]
    pub persistence_retries: u32,
    /// Base backoff between retries in milliseconds (multiplied by attempt).
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_persistence_retries() -> u32 {
    2
}

fn default_retry_backoff() -> u64 {
    250
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            persistence_retries: default_persistence_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

/// Background sweep configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Whether the web server also runs the sweep worker.
    #[serde(default = "default_sweep_enabled")]
    pub enabled: bool,
    /// Seconds between sweeps.
    #[serde(default = "default_sweep_interval")]
    pub interval_secs: u64,
    /// Feeds processed in parallel within a sweep.
    #[serde(default = "default_sweep_concurrency")]
    pub concurrency: usize,
}

fn default_sweep_enabled() -> bool {
    false
}

fn default_sweep_interval() -> u64 {
    6 * 60 * 60 // 6 hours
}

fn default_sweep_concurrency() -> usize {
    1
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: default_sweep_enabled(),
            interval_secs: default_sweep_interval(),
            concurrency: default_sweep_concurrency(),
        }
    }
}

/// Token verification configuration.
///
/// Tokens are issued by the external auth service; this side only verifies.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    /// HS256 secret shared with the auth service.
    #[serde(default)]
    pub jwt_secret: String,
    /// Expected `aud` claim (not checked when unset).
    #[serde(default)]
    pub audience: Option<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Feed fetching configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Ingestion configuration.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Background sweep configuration.
    #[serde(default)]
    pub sweep: SweepConfig,
    /// Token verification configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FoloError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration like [`Config::load_with_env`], falling back to the
    /// defaults when the file is missing or invalid.
    ///
    /// Runs before logging is set up, so problems go to stderr.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load_with_env(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {e}", path.display());
                eprintln!("Using default configuration.");
                let mut config = Self::default();
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FoloError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FOLO_JWT_SECRET`: Override the token verification secret
    /// - `FOLO_DATABASE_URL`: Override the database URL
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("FOLO_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.auth.jwt_secret = jwt_secret;
            }
        }
        if let Ok(url) = std::env::var("FOLO_DATABASE_URL") {
            if !url.is_empty() {
                self.database.url = url;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(FoloError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via FOLO_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.sweep.interval_secs == 0 {
            return Err(FoloError::Config(
                "sweep.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.sweep.concurrency == 0 {
            return Err(FoloError::Config(
                "sweep.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
