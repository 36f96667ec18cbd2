//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Session token configuration.
    pub auth: AuthConfig,
    /// Object storage configuration.
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Session token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret key for signing session tokens.
    pub secret: String,
    /// Session token expiration in seconds.
    #[serde(default = "default_session_expiry")]
    pub session_expiry_secs: u64,
}

fn default_session_expiry() -> u64 {
    2_592_000 // 30 days
}

/// Object storage configuration, deserialized from config files / env.
///
/// Provider selection and credentials live here; the core storage
/// crate converts this into its own `StorageConfig`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Provider kind: "s3", "azure_blob", or "local".
    #[serde(default = "default_storage_provider")]
    pub provider: String,
    /// S3 endpoint URL (S3-compatible providers).
    #[serde(default)]
    pub endpoint: String,
    /// Bucket or container name.
    #[serde(default)]
    pub bucket: String,
    /// Access key id (S3) or account name (Azure).
    #[serde(default)]
    pub access_key_id: String,
    /// Secret access key (S3) or account key (Azure).
    #[serde(default)]
    pub secret_access_key: String,
    /// Region (S3).
    #[serde(default = "default_storage_region")]
    pub region: String,
    /// Root directory for the local filesystem provider.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Base URL under which uploaded objects are publicly reachable.
    pub public_base_url: String,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_storage_provider() -> String {
    "local".to_string()
}

fn default_storage_region() -> String {
    "auto".to_string()
}

fn default_storage_root() -> String {
    "./storage".to_string()
}

fn default_max_upload_size() -> u64 {
    5 * 1024 * 1024 // 5 MiB, matches the UI-level limit
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("INKPOST").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
