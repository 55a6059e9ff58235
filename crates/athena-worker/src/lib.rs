//! Athena Worker
//!
//! Long-running worker process that emits heartbeats, processes agent tasks
//! handed to it, and shuts down cleanly on signal.

pub mod config;
pub mod error;
pub mod handler;
pub mod heartbeat;
pub mod source;
pub mod worker;

pub use config::WorkerConfig;
pub use error::{Result, WorkerError};
pub use handler::{SimulatedHandler, TaskHandler};
pub use heartbeat::{StatsSnapshot, WorkerStats};
pub use source::{MemorySink, MemorySource, ResultSink, SinkError, TaskSource};
pub use worker::{Worker, WorkerState};
