//! Execution results.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorKind, StepFailure};

/// How an execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalState {
  Succeeded,
  Failed,
  TimedOut,
}

/// Outcome of an execution, with its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum TerminalResult {
  /// A step with no successor completed; `output` is the final context.
  Succeeded { output: Value },
  /// A step failed. Nothing after it ran.
  Failed { failure: StepFailure },
  /// The execution deadline passed. `step` is the step that was in flight.
  TimedOut {
    step: Option<String>,
    #[serde(rename = "timeout_ms", with = "crate::millis")]
    timeout: Duration,
  },
}

impl TerminalResult {
  pub fn state(&self) -> TerminalState {
    match self {
      TerminalResult::Succeeded { .. } => TerminalState::Succeeded,
      TerminalResult::Failed { .. } => TerminalState::Failed,
      TerminalResult::TimedOut { .. } => TerminalState::TimedOut,
    }
  }

  /// The failure classification, if the execution did not succeed.
  pub fn error_kind(&self) -> Option<ErrorKind> {
    match self {
      TerminalResult::Succeeded { .. } => None,
      TerminalResult::Failed { failure } => Some(failure.kind),
      TerminalResult::TimedOut { .. } => Some(ErrorKind::WorkflowTimeout),
    }
  }
}

/// Result of a complete workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
  /// Unique execution ID.
  pub execution_id: String,
  pub workflow: String,
  /// Names of the steps that were started, in order.
  pub visited: Vec<String>,
  #[serde(rename = "elapsed_ms", with = "crate::millis")]
  pub elapsed: Duration,
  pub result: TerminalResult,
}

impl ExecutionResult {
  pub fn state(&self) -> TerminalState {
    self.result.state()
  }

  pub fn is_success(&self) -> bool {
    self.state() == TerminalState::Succeeded
  }

  pub fn output(&self) -> Option<&Value> {
    match &self.result {
      TerminalResult::Succeeded { output } => Some(output),
      _ => None,
    }
  }

  pub fn failure(&self) -> Option<&StepFailure> {
    match &self.result {
      TerminalResult::Failed { failure } => Some(failure),
      _ => None,
    }
  }

  /// Whether a step with this name was started.
  pub fn visited_step(&self, name: &str) -> bool {
    self.visited.iter().any(|step| step == name)
  }
}
