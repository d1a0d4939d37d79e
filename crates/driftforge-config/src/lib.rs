//! Engine configuration.
//!
//! Configuration is a single YAML document with environment variable
//! expansion (`${VAR}`) applied before parsing. Every section and every
//! field is optional; omitted parts fall back to defaults that run the
//! engine in-memory on port 8080.
//!
//! ```yaml
//! api:
//!   listen_addr: "0.0.0.0:8080"
//! store:
//!   backend: sqlite
//!   path: "${DRIFTFORGE_DATA}/driftforge.db"
//! inference:
//!   max_depth: 64
//! logging:
//!   level: info
//!   json: true
//! metrics:
//!   enable: true
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to expand environment variables: {0}")]
    Env(String),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub api: ApiConfig,
    pub store: StoreConfig,
    pub inference: InferenceConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// HTTP surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address the API binds to, `host:port`.
    pub listen_addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Persistence backend selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database file location. Only read for the sqlite backend.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: "driftforge.db".to_string(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Structural inference knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Nesting cutoff; deeper nodes collapse to a null leaf.
    pub max_depth: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// Log subscriber settings, handed to the o11y layer at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `driftforge=debug`. `RUST_LOG`
    /// wins over this when set.
    pub level: Option<String>,
    /// Emit JSON lines instead of the human format.
    pub json: bool,
    /// Include module targets in the human format.
    pub with_targets: bool,
}

/// Prometheus exposition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enable: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enable: true }
    }
}

/// Reads, expands and parses the config file at `path`.
pub fn load_from_path(path: &str) -> Result<EngineConfig, ConfigError> {
    let raw =
        std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
    let expanded =
        shellexpand::env(&raw).map_err(|e| ConfigError::Env(e.to_string()))?;
    let config = serde_yaml::from_str(&expanded)?;
    Ok(config)
}
