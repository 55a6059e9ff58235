//! Worker configuration

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

/// Worker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Worker settings
    pub worker: WorkerSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Worker execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Fixed worker id (auto-generated if not set)
    pub worker_id: Option<String>,
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval_ms: u64,
    /// Simulated processing time per task in milliseconds
    pub simulated_work_ms: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by RUST_LOG
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            worker_id: None,
            heartbeat_interval_ms: 5_000,
            simulated_work_ms: 100,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from an optional file, then `ATHENA_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `ATHENA_WORKER__HEARTBEAT_INTERVAL_MS`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: WorkerConfig = builder
            .add_source(
                Environment::with_prefix("ATHENA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Message(
                "worker.heartbeat_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl WorkerSettings {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn simulated_work(&self) -> Duration {
        Duration::from_millis(self.simulated_work_ms)
    }

    /// Configured id, or the first segment of a fresh v4 UUID.
    pub fn generate_worker_id(&self) -> String {
        match self.worker_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let uuid = Uuid::new_v4().simple().to_string();
                uuid[..8].to_string()
            }
        }
    }
}
