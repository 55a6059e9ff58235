//! Interfaces for the task source and result sink the worker runs against.
//!
//! A queue-backed source and a persistent sink would implement these traits;
//! the in-memory versions here serve tests and embedding.

use async_trait::async_trait;
use athena_core::{Task, TaskResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("result sink closed")]
    Closed,

    #[error("failed to publish result for task {task_id}: {reason}")]
    Publish { task_id: String, reason: String },
}

/// Supplies tasks to the worker.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Next task, or `None` when nothing is available.
    async fn supply(&self) -> Option<Task>;
}

/// Consumes results produced by the worker.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn publish(&self, result: TaskResult) -> Result<(), SinkError>;
}

/// FIFO source over an in-memory list. Priority is not consulted.
#[derive(Debug, Default)]
pub struct MemorySource {
    tasks: Mutex<VecDeque<Task>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, task: Task) {
        self.tasks.lock().push_back(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

impl FromIterator<Task> for MemorySource {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        MemorySource {
            tasks: Mutex::new(iter.into_iter().collect()),
        }
    }
}

#[async_trait]
impl TaskSource for MemorySource {
    async fn supply(&self) -> Option<Task> {
        self.tasks.lock().pop_front()
    }
}

/// Sink that keeps every published result in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    results: Mutex<Vec<TaskResult>>,
    closed: Mutex<bool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every later publish with [`SinkError::Closed`].
    pub fn close(&self) {
        *self.closed.lock() = true;
    }

    pub fn results(&self) -> Vec<TaskResult> {
        self.results.lock().clone()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn publish(&self, result: TaskResult) -> Result<(), SinkError> {
        if *self.closed.lock() {
            return Err(SinkError::Closed);
        }
        self.results.lock().push(result);
        Ok(())
    }
}
