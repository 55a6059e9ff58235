use async_trait::async_trait;
use athena_core::Task;
use std::time::Duration;

/// Result type for task handlers: output text, or a failure message
pub type HandlerResult = Result<String, String>;

/// Trait for task handlers
///
/// This is where real work (invoking an agent, calling a model, running a tool)
/// plugs into the worker. An `Err` becomes a `failed` task result; it never
/// aborts the worker.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &Task) -> HandlerResult;
}

/// Placeholder handler that simulates work with a fixed delay
#[derive(Debug, Clone)]
pub struct SimulatedHandler {
    delay: Duration,
}

impl SimulatedHandler {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

    pub fn new(delay: Duration) -> Self {
        SimulatedHandler { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedHandler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

#[async_trait]
impl TaskHandler for SimulatedHandler {
    async fn handle(&self, task: &Task) -> HandlerResult {
        // Not interruptible; real work replacing this must honor cancellation.
        tokio::time::sleep(self.delay).await;
        Ok(format!(
            "Task {} processed successfully by agent {}",
            task.id, task.agent_id
        ))
    }
}
