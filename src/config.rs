//! Configuration types for batch-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Download behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Directory downloaded files are written to (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Per-request timeout for a single fetch (default: 60 seconds)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub fetch_timeout: Duration,

    /// Base name used when a URL has no usable final path segment (default: "download")
    #[serde(default = "default_file_name")]
    pub default_file_name: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            fetch_timeout: default_fetch_timeout(),
            default_file_name: default_file_name(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Snapshot file holding the full task registry (default: "./data/state.json")
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

/// Worker loop configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkerConfig {
    /// Longest time an idle worker waits before rescanning without a wake-up (default: 1 second)
    #[serde(default = "default_idle_poll_interval", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub idle_poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            idle_poll_interval: default_idle_poll_interval(),
        }
    }
}

/// Shutdown timing
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ShutdownConfig {
    /// Window after the worker is stopped during which task creation is still accepted (default: 5 seconds)
    #[serde(default = "default_grace_period", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub grace_period: Duration,

    /// Upper bound on closing the HTTP listener (default: 5 seconds)
    #[serde(default = "default_server_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub server_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
            server_timeout: default_server_timeout(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: false)
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: false,
        }
    }
}

/// Main configuration for TaskManager
///
/// Every field has a default, so an empty JSON object is a valid configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Snapshot persistence
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Worker loop tuning
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Shutdown timing
    #[serde(default)]
    pub shutdown: ShutdownConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read '{}': {}", path.display(), e),
            key: None,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("invalid configuration in '{}': {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        let non_zero = [
            ("download.fetch_timeout", self.download.fetch_timeout),
            ("worker.idle_poll_interval", self.worker.idle_poll_interval),
        ];
        for (key, value) in non_zero {
            if value.is_zero() {
                return Err(Error::Config {
                    message: format!("{key} must be at least 1 second"),
                    key: Some(key.into()),
                });
            }
        }
        Ok(())
    }

    /// Download directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }

    /// Snapshot path
    pub fn snapshot_path(&self) -> &PathBuf {
        &self.persistence.snapshot_path
    }
}

// Default value functions
fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_file_name() -> String {
    "download".into()
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data").join("state.json")
}

fn default_idle_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_grace_period() -> Duration {
    Duration::from_secs(5)
}

fn default_server_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
