use crate::config::WorkerSettings;
use crate::error::{Result, WorkerError};
use crate::handler::{SimulatedHandler, TaskHandler};
use crate::heartbeat::{StatsSnapshot, WorkerStats};
use crate::source::{ResultSink, TaskSource};
use athena_core::{Task, TaskResult};

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument, Span};

/// Shortest heartbeat period the loop will run with.
const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle of a worker. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Created,
    Running,
    ShuttingDown,
    Stopped,
}

/// Worker process that emits heartbeats and processes tasks
pub struct Worker {
    id: String,
    settings: WorkerSettings,
    handler: Arc<dyn TaskHandler>,
    state: Mutex<WorkerState>,
    stats: WorkerStats,
    shutdown: CancellationToken,
    span: Span,
}

impl Worker {
    pub fn new(settings: WorkerSettings) -> Self {
        let id = settings.generate_worker_id();
        let span = info_span!("worker", worker_id = %id);
        let handler = Arc::new(SimulatedHandler::new(settings.simulated_work()));

        Worker {
            id,
            settings,
            handler,
            state: Mutex::new(WorkerState::Created),
            stats: WorkerStats::new(),
            shutdown: CancellationToken::new(),
            span,
        }
    }

    /// Replace the simulated handler with real task execution.
    pub fn with_handler(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Token that fires once shutdown has been requested.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Run the heartbeat loop until `cancel` fires or shutdown is requested.
    ///
    /// Returns `Ok(())` after an internal shutdown and [`WorkerError::Cancelled`]
    /// when the external token fired first. A worker runs at most once.
    pub async fn start(&self, cancel: CancellationToken) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state != WorkerState::Created {
                return Err(WorkerError::AlreadyStarted);
            }
            *state = WorkerState::Running;
        }

        let outcome = self.run(cancel).instrument(self.span.clone()).await;
        self.set_state(WorkerState::Stopped);
        outcome
    }

    async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let period = self.settings.heartbeat_interval().max(MIN_HEARTBEAT_INTERVAL);
        info!(heartbeat_interval_ms = period.as_millis() as u64, "Starting Athena worker");

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    self.set_state(WorkerState::ShuttingDown);
                    info!("Context cancelled, shutting down");
                    return Err(WorkerError::Cancelled);
                }

                _ = self.shutdown.cancelled() => {
                    self.set_state(WorkerState::ShuttingDown);
                    info!("Shutdown signal received");
                    return Ok(());
                }

                _ = ticker.tick() => {
                    self.stats.record_heartbeat();
                    let stats = self.stats.snapshot();
                    debug!(
                        heartbeats = stats.heartbeats,
                        tasks_completed = stats.tasks_completed,
                        tasks_failed = stats.tasks_failed,
                        uptime_seconds = stats.uptime_seconds,
                        "Worker heartbeat"
                    );
                }
            }
        }
    }

    /// Ask a running `start` loop to return. Safe to call repeatedly and from any thread.
    pub fn request_shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            self.span.in_scope(|| info!("Initiating graceful shutdown"));
        }
        self.shutdown.cancel();
    }

    /// Process a single task and produce its result.
    ///
    /// Tasks without an id are rejected with a validation error. A handler
    /// failure is reported as a `failed` result, not as an error.
    pub async fn process_task(&self, task: &Task) -> Result<TaskResult> {
        let started = Instant::now();

        async {
            if let Err(e) = task.validate() {
                warn!(agent_id = %task.agent_id, error = %e, "Rejected task");
                return Err(WorkerError::from(e));
            }

            info!(
                task_id = %task.id,
                agent_id = %task.agent_id,
                task_type = %task.task_type,
                "Processing task"
            );

            let result = match self.handler.handle(task).await {
                Ok(output) => {
                    self.stats.record_success();
                    TaskResult::completed(&task.id, output, started.elapsed())
                }
                Err(error) => {
                    self.stats.record_failure();
                    warn!(task_id = %task.id, error = %error, "Task failed");
                    TaskResult::failed(&task.id, error, started.elapsed())
                }
            };

            info!(
                task_id = %task.id,
                agent_id = %task.agent_id,
                status = %result.status,
                duration_ms = result.duration_ms,
                "Task completed"
            );

            Ok(result)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Pull one task from `source`, process it and publish the result to `sink`.
    ///
    /// Returns `Ok(None)` when the source has nothing to hand out.
    pub async fn process_next<S, R>(&self, source: &S, sink: &R) -> Result<Option<TaskResult>>
    where
        S: TaskSource + ?Sized,
        R: ResultSink + ?Sized,
    {
        let Some(task) = source.supply().await else {
            return Ok(None);
        };

        let result = self.process_task(&task).await?;
        sink.publish(result.clone()).await?;
        Ok(Some(result))
    }

    fn set_state(&self, next: WorkerState) {
        *self.state.lock() = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerResult;
    use athena_core::TaskStatus;
    use async_trait::async_trait;

    fn test_settings() -> WorkerSettings {
        WorkerSettings {
            worker_id: None,
            heartbeat_interval_ms: 50,
            simulated_work_ms: 10,
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl TaskHandler for FailingHandler {
        async fn handle(&self, _task: &Task) -> HandlerResult {
            Err("model unavailable".to_string())
        }
    }

    #[test]
    fn test_worker_creation() {
        let worker = Worker::new(test_settings());
        assert_eq!(worker.id().len(), 8);
        assert_eq!(worker.state(), WorkerState::Created);
        assert!(!worker.is_shutdown_requested());
    }

    #[test]
    fn test_request_shutdown_twice() {
        let worker = Worker::new(test_settings());
        worker.request_shutdown();
        worker.request_shutdown();
        assert!(worker.is_shutdown_requested());
        assert!(worker.shutdown_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_start_after_shutdown_returns_ok() {
        let worker = Worker::new(test_settings());
        worker.request_shutdown();

        worker.start(CancellationToken::new()).await.unwrap();
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[tokio::test]
    async fn test_start_is_terminal() {
        let worker = Worker::new(test_settings());
        worker.request_shutdown();
        worker.start(CancellationToken::new()).await.unwrap();

        let err = worker.start(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, WorkerError::AlreadyStarted));
    }

    #[tokio::test]
    async fn test_cancellation_wins_when_both_fired() {
        let worker = Worker::new(test_settings());
        let cancel = CancellationToken::new();
        worker.request_shutdown();
        cancel.cancel();

        let err = worker.start(cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_process_task() {
        let worker = Worker::new(test_settings());
        let task = Task::new("t1", "a1", "echo", "hello").with_priority(1);

        let result = worker.process_task(&task).await.unwrap();
        assert_eq!(result.task_id, "t1");
        assert_eq!(result.status, TaskStatus::Completed);
        assert_eq!(result.error, "");
        assert!(result.output.contains("t1"));
        assert!(result.output.contains("a1"));
        assert!(result.duration_ms >= 10);
        assert_eq!(worker.stats().tasks_completed, 1);
    }

    #[tokio::test]
    async fn test_process_task_rejects_empty_id() {
        let worker = Worker::new(test_settings());
        let err = worker
            .process_task(&Task::new("", "a1", "echo", "hello"))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(worker.stats().tasks_processed(), 0);
    }

    #[tokio::test]
    async fn test_handler_failure_is_failed_result() {
        let worker = Worker::new(test_settings()).with_handler(Arc::new(FailingHandler));

        let result = worker
            .process_task(&Task::new("t1", "a1", "chat", "hi"))
            .await
            .unwrap();

        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.error, "model unavailable");
        assert!(result.is_consistent());
        assert_eq!(worker.stats().tasks_failed, 1);
    }
}
