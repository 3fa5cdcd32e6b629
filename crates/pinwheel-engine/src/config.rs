//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Five minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(3);

/// Configuration for the workflow engine.
///
/// Definitions may override both values: a state machine's
/// `timeout_seconds` replaces `default_timeout`, a task step's
/// `timeout_seconds` replaces `default_task_timeout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Budget for a whole execution.
  #[serde(rename = "default_timeout_ms", with = "crate::millis")]
  pub default_timeout: Duration,
  /// Budget for one task invocation.
  #[serde(rename = "default_task_timeout_ms", with = "crate::millis")]
  pub default_task_timeout: Duration,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      default_timeout: DEFAULT_TIMEOUT,
      default_task_timeout: DEFAULT_TASK_TIMEOUT,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_defaults() {
    let config: EngineConfig = serde_json::from_value(json!({})).unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.default_timeout, Duration::from_secs(300));
    assert_eq!(config.default_task_timeout, Duration::from_secs(3));
  }

  #[test]
  fn test_millisecond_fields() {
    let config: EngineConfig = serde_json::from_value(json!({
      "default_timeout_ms": 1500,
    }))
    .unwrap();
    assert_eq!(config.default_timeout, Duration::from_millis(1500));
    assert_eq!(config.default_task_timeout, DEFAULT_TASK_TIMEOUT);

    let value = serde_json::to_value(&config).unwrap();
    assert_eq!(
      value,
      json!({ "default_timeout_ms": 1500, "default_task_timeout_ms": 3000 })
    );
  }
}
