//! Athena Core Library
//!
//! Data records exchanged between the Athena worker and the agent platform:
//! tasks, task results, and their JSON wire encoding.

pub mod codec;
mod error;
mod result;
mod task;

pub use codec::{MAX_CONFIG_DEPTH, decode_result, decode_task, encode_result, encode_task, encode_task_pretty};
pub use error::{CoreError, Result};
pub use result::{TaskResult, TaskStatus};
pub use task::{ConfigMap, ConfigValue, Task};
