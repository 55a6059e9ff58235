//! Worker liveness statistics reported with every heartbeat.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters shared between the heartbeat loop and task processing.
#[derive(Debug)]
pub struct WorkerStats {
    started_at: Instant,
    heartbeats: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
}

/// Point-in-time copy of [`WorkerStats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Heartbeats emitted since the worker started
    pub heartbeats: u64,
    /// Tasks that produced a completed result
    pub tasks_completed: u64,
    /// Tasks that produced a failed result
    pub tasks_failed: u64,
    /// Seconds since the worker was created
    pub uptime_seconds: u64,
}

impl Default for WorkerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            heartbeats: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
        }
    }

    /// Record a heartbeat and return the running count.
    pub fn record_heartbeat(&self) -> u64 {
        self.heartbeats.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_success(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn heartbeats(&self) -> u64 {
        self.heartbeats.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            heartbeats: self.heartbeats.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }
}

impl StatsSnapshot {
    pub fn tasks_processed(&self) -> u64 {
        self.tasks_completed + self.tasks_failed
    }
}
