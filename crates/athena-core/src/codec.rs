//! JSON encoding for records crossing a process or storage boundary.
//!
//! Field names on the wire are the record field names (`type` for the task
//! category). Config mappings are key-ordered, so encoding is deterministic.

use crate::{ConfigValue, CoreError, Result, Task, TaskResult};

/// Deepest nesting of arrays and objects allowed inside a single config value.
///
/// Kept below the decoder's limit of 128 nested containers, which also has to
/// cover the task object and the `config` map around the value.
pub const MAX_CONFIG_DEPTH: usize = 120;

/// Serialize a task to JSON bytes.
///
/// Fails with an encoding error when `config` nests deeper than
/// [`MAX_CONFIG_DEPTH`], since such bytes could not be decoded again.
pub fn encode_task(task: &Task) -> Result<Vec<u8>> {
    check_config_depth(task)?;
    serde_json::to_vec(task).map_err(CoreError::Encoding)
}

/// Serialize a task to indented JSON for display.
pub fn encode_task_pretty(task: &Task) -> Result<String> {
    check_config_depth(task)?;
    serde_json::to_string_pretty(task).map_err(CoreError::Encoding)
}

fn check_config_depth(task: &Task) -> Result<()> {
    for value in task.config.values() {
        if exceeds_depth(value, MAX_CONFIG_DEPTH) {
            return Err(CoreError::ConfigTooDeep { max: MAX_CONFIG_DEPTH });
        }
    }
    Ok(())
}

// Stops descending once the budget is spent, so recursion stays bounded.
fn exceeds_depth(value: &ConfigValue, budget: usize) -> bool {
    match value {
        ConfigValue::Array(items) => {
            budget == 0 || items.iter().any(|item| exceeds_depth(item, budget - 1))
        }
        ConfigValue::Object(entries) => {
            budget == 0 || entries.values().any(|entry| exceeds_depth(entry, budget - 1))
        }
        _ => false,
    }
}

/// Deserialize a task from JSON bytes.
///
/// Empty, truncated or mis-shaped input is a decoding error; a partially
/// populated task is never returned.
pub fn decode_task(bytes: &[u8]) -> Result<Task> {
    serde_json::from_slice(bytes).map_err(CoreError::Decoding)
}

/// Serialize a task result to JSON bytes.
pub fn encode_result(result: &TaskResult) -> Result<Vec<u8>> {
    serde_json::to_vec(result).map_err(CoreError::Encoding)
}

/// Deserialize a task result, rejecting records whose `error` disagrees with `status`.
pub fn decode_result(bytes: &[u8]) -> Result<TaskResult> {
    let result: TaskResult = serde_json::from_slice(bytes).map_err(CoreError::Decoding)?;
    if !result.is_consistent() {
        return Err(CoreError::InvalidResult(format!(
            "status {} with error {:?}",
            result.status, result.error
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskStatus;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::time::Duration;

    fn sample_task() -> Task {
        Task::new("t1", "a1", "echo", "hello")
            .with_priority(1)
            .with_config_value("temperature", json!(0.25))
            .with_config_value("nested", json!({"list": [1, "two", null, {"deep": true}]}))
            .with_created_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
    }

    #[test]
    fn test_task_roundtrip() {
        let task = sample_task();
        let bytes = encode_task(&task).unwrap();
        assert_eq!(decode_task(&bytes).unwrap(), task);
    }

    #[test]
    fn test_wire_field_names() {
        let bytes = encode_task(&sample_task()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        for field in ["id", "agent_id", "type", "input", "config", "priority", "created_at"] {
            assert!(value.get(field).is_some(), "missing field {}", field);
        }
        assert!(value.get("task_type").is_none());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let task = sample_task();
        assert_eq!(encode_task(&task).unwrap(), encode_task(&task.clone()).unwrap());
    }

    #[test]
    fn test_pretty_is_decodable() {
        let task = sample_task();
        let pretty = encode_task_pretty(&task).unwrap();
        assert!(pretty.contains('\n'));
        assert_eq!(decode_task(pretty.as_bytes()).unwrap(), task);
    }

    fn nested_array(depth: usize) -> ConfigValue {
        (0..depth).fold(json!(1), |inner, _| ConfigValue::Array(vec![inner]))
    }

    #[test]
    fn test_deep_config_within_limit_roundtrips() {
        let task = sample_task().with_config_value("deep", nested_array(MAX_CONFIG_DEPTH));
        let bytes = encode_task(&task).unwrap();
        assert_eq!(decode_task(&bytes).unwrap(), task);
    }

    #[test]
    fn test_deep_config_past_limit_rejected_at_encode() {
        let task = sample_task().with_config_value("deep", nested_array(200));

        let err = encode_task(&task).unwrap_err();
        assert!(matches!(err, CoreError::ConfigTooDeep { max: MAX_CONFIG_DEPTH }));
        assert!(err.is_encoding());
        assert!(encode_task_pretty(&task).unwrap_err().is_encoding());

        let shallow = sample_task().with_config_value("deep", nested_array(MAX_CONFIG_DEPTH + 1));
        assert!(encode_task(&shallow).unwrap_err().is_encoding());
    }

    #[test]
    fn test_decode_empty_input() {
        let err = decode_task(b"").unwrap_err();
        assert!(err.is_decoding());
    }

    #[test]
    fn test_decode_truncated_input() {
        let bytes = encode_task(&sample_task()).unwrap();
        for len in [1, bytes.len() / 2, bytes.len() - 1] {
            assert!(decode_task(&bytes[..len]).unwrap_err().is_decoding());
        }
    }

    #[test]
    fn test_decode_wrong_shape() {
        let inputs: [&[u8]; 4] = [
            b"null",
            b"[]",
            br#"{"id":"t1","agent_id":"a1"}"#,
            br#"{"id":"t1","agent_id":"a1","type":"echo","input":"x","config":{},"priority":"high","created_at":"2024-05-01T12:30:00Z"}"#,
        ];
        for input in inputs {
            assert!(decode_task(input).unwrap_err().is_decoding());
        }
    }

    #[test]
    fn test_decode_bad_timestamp() {
        let input = br#"{"id":"t1","agent_id":"a1","type":"echo","input":"x","config":{},"priority":1,"created_at":"yesterday"}"#;
        assert!(decode_task(input).unwrap_err().is_decoding());
    }

    #[test]
    fn test_result_omits_empty_error() {
        let result = TaskResult::completed("t1", "ok", Duration::from_millis(3));
        let bytes = encode_result(&result).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert!(value.get("error").is_none());
        assert_eq!(value["status"], json!("completed"));
        assert_eq!(value["duration_ms"], json!(3));
        assert_eq!(decode_result(&bytes).unwrap(), result);
    }

    #[test]
    fn test_failed_result_roundtrip() {
        let result = TaskResult::failed("t1", "model unavailable", Duration::from_millis(40));
        let decoded = decode_result(&encode_result(&result).unwrap()).unwrap();
        assert_eq!(decoded.status, TaskStatus::Failed);
        assert_eq!(decoded.error, "model unavailable");
    }

    #[test]
    fn test_decode_inconsistent_result() {
        let input = br#"{"task_id":"t1","status":"failed","output":"","processed_at":"2024-05-01T12:30:00Z","duration_ms":5}"#;
        match decode_result(input) {
            Err(CoreError::InvalidResult(_)) => {}
            other => panic!("Expected InvalidResult, got {:?}", other),
        }

        let unknown_status = br#"{"task_id":"t1","status":"pending","output":"","processed_at":"2024-05-01T12:30:00Z","duration_ms":5}"#;
        assert!(decode_result(unknown_status).unwrap_err().is_decoding());
    }
}
