use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::retry::{RetryPolicy, DEFAULT_BACKOFF_STEP, DEFAULT_MAX_RETRIES};

pub const DEFAULT_BASE_URL: &str = "https://api.tvmaze.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Everything the worker needs. Each section falls back to defaults when
/// omitted from the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub source: SourceConfig,
    pub storage: StorageConfig,
    pub worker: WorkerConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_step_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file holding shows and committed pages. `None` keeps
    /// everything in memory for the lifetime of the process.
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Pause between a cycle that reached the end of the catalog and the next.
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the read API binds to.
    pub listen_addr: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_step_secs: DEFAULT_BACKOFF_STEP.as_secs(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::linear(
            self.max_retries,
            Duration::from_secs(self.backoff_step_secs),
        )
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr.parse().map_err(|_| ConfigError::Invalid {
            field: "server.listen_addr",
            message: format!("{:?} is not a socket address", self.listen_addr),
        })
    }
}

impl ScraperConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = &self.source.base_url;
        if reqwest::Url::parse(base_url).is_err() {
            return Err(ConfigError::Invalid {
                field: "source.base_url",
                message: format!("{base_url:?} is not an absolute URL"),
            });
        }
        if self.source.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "source.request_timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if matches!(&self.storage.database_path, Some(path) if path.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "storage.database_path",
                message: "must not be empty; omit it for an in-memory store".to_string(),
            });
        }
        if self.worker.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "worker.poll_interval_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        self.server.socket_addr()?;
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            base_url = %self.source.base_url,
            database_path = ?self.storage.database_path,
            poll_interval_secs = self.worker.poll_interval_secs,
            listen_addr = %self.server.listen_addr,
            max_retries = self.source.retry.max_retries,
            "Loaded ScraperConfig"
        );
        debug!(?self, "ScraperConfig loaded (full debug)");
    }
}
