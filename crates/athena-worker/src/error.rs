use crate::source::SinkError;
use athena_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    /// The external cancellation token fired before an internal shutdown.
    #[error("worker cancelled")]
    Cancelled,

    #[error("worker has already been started")]
    AlreadyStarted,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl WorkerError {
    /// Cancellation is the expected shutdown path, not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Cancelled)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, WorkerError::Core(CoreError::Validation(_)))
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;
