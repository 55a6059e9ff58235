use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Outcome of a single processing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task was processed and produced output
    Completed,
    /// Task was processed and failed; `error` explains why
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(TaskStatus::Completed),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome record produced after a task is processed.
///
/// Build it through [`TaskResult::completed`] or [`TaskResult::failed`] so that
/// `error` is non-empty exactly when `status` is `failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskStatus,
    pub output: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub processed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl TaskResult {
    pub fn completed(task_id: impl Into<String>, output: impl Into<String>, elapsed: Duration) -> Self {
        TaskResult {
            task_id: task_id.into(),
            status: TaskStatus::Completed,
            output: output.into(),
            error: String::new(),
            processed_at: Utc::now(),
            duration_ms: millis(elapsed),
        }
    }

    /// An empty `error` is replaced so the failure always carries a reason.
    pub fn failed(task_id: impl Into<String>, error: impl Into<String>, elapsed: Duration) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown error".to_string();
        }

        TaskResult {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            output: String::new(),
            error,
            processed_at: Utc::now(),
            duration_ms: millis(elapsed),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// `error` is non-empty iff the status is `failed`.
    pub fn is_consistent(&self) -> bool {
        self.status.is_failure() != self.error.is_empty()
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
