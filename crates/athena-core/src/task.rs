use crate::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open-schema value carried in a task's `config`.
///
/// A tagged union of null, bool, number, string, sequence and mapping, so
/// arbitrarily nested configuration survives without a fixed structure.
pub type ConfigValue = serde_json::Value;

/// Mapping from configuration keys to open-schema values.
pub type ConfigMap = serde_json::Map<String, ConfigValue>;

/// A unit of work submitted for processing on behalf of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque unique identifier
    pub id: String,

    /// Identifier of the owning agent
    pub agent_id: String,

    /// Task category (open vocabulary, e.g. "echo", "chat", "tool_call")
    #[serde(rename = "type")]
    pub task_type: String,

    /// Task payload, may itself be an encoded structure
    pub input: String,

    /// Open-schema task configuration
    pub config: ConfigMap,

    /// Carried for the task source; not consulted by the worker
    pub priority: i32,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task with default priority and empty configuration.
    pub fn new(
        id: impl Into<String>,
        agent_id: impl Into<String>,
        task_type: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Task {
            id: id.into(),
            agent_id: agent_id.into(),
            task_type: task_type.into(),
            input: input.into(),
            config: ConfigMap::new(),
            priority: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_config(mut self, config: ConfigMap) -> Self {
        self.config = config;
        self
    }

    pub fn with_config_value(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Check that the task is well-formed enough to be processed.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(CoreError::Validation("task id must not be empty".to_string()));
        }
        Ok(())
    }

    /// Look up a configuration value by key.
    pub fn config_value(&self, key: &str) -> Option<&ConfigValue> {
        self.config.get(key)
    }
}
