//! Configuration management for finboard
//!
//! This module handles loading, validation, and management of
//! finboard configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::ConfigError;

/// Hard upper bound on page size, regardless of configuration
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Development signing secret, replaced in any real deployment
pub const DEV_JWT_SECRET: &str = "finboard-dev-secret-change-in-production";

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow cross-origin requests from any origin
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Try to connect at startup; when false the in-memory stores are used
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Insert demo data into an empty store
    #[serde(default = "default_true")]
    pub seed_demo_data: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
            seed_demo_data: true,
        }
    }
}

fn default_database_url() -> String {
    "sqlite://finboard.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    5
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign session tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Session token lifetime in days
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: u32,
    /// JSON file backing the user store when no database is available
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,
    /// Minimum accepted password length on registration
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_days: default_token_ttl_days(),
            users_file: default_users_file(),
            min_password_length: default_min_password_length(),
        }
    }
}

impl AuthConfig {
    /// Whether the built-in development secret is still in use
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_token_ttl_days() -> u32 {
    7
}

fn default_users_file() -> PathBuf {
    PathBuf::from("./mock-users.json")
}

fn default_min_password_length() -> usize {
    6
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
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

fn default_log_level() -> String {
    "info".to_string()
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when a request does not name one
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

fn default_limit() -> u32 {
    10
}

/// CSV export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Average CSV row size used for the file size estimate
    #[serde(default = "default_bytes_per_record")]
    pub bytes_per_record: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            bytes_per_record: default_bytes_per_record(),
        }
    }
}

fn default_bytes_per_record() -> u64 {
    150
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::IoError)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.database.enabled && self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.url".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.max_connections".to_string(),
                reason: "Pool size must be at least 1".to_string(),
            });
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingField {
                field: "auth.jwt_secret".to_string(),
            });
        }

        if self.auth.token_ttl_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "auth.token_ttl_days".to_string(),
                reason: "Token lifetime must be at least one day".to_string(),
            });
        }

        if self.pagination.default_limit == 0 || self.pagination.default_limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "pagination.default_limit".to_string(),
                reason: format!("Default page size must be between 1 and {}", MAX_PAGE_LIMIT),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
