use std::time::Duration;

use thiserror::Error;

/// Error reported by a task implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
  /// The task ran and failed.
  #[error("{message}")]
  Failed { message: String },

  /// The task rejected its input.
  #[error("invalid task input: {message}")]
  InvalidInput { message: String },
}

impl TaskError {
  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed {
      message: message.into(),
    }
  }

  pub fn invalid_input(message: impl Into<String>) -> Self {
    Self::InvalidInput {
      message: message.into(),
    }
  }
}

/// Error from one budgeted invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
  #[error("task not registered: {task}")]
  UnknownTask { task: String },

  #[error("task '{task}' exceeded its budget of {budget:?}")]
  Timeout { task: String, budget: Duration },

  #[error("task '{task}' failed")]
  Failed {
    task: String,
    #[source]
    source: TaskError,
  },

  /// The task panicked or its runtime went away.
  #[error("task '{task}' aborted: {message}")]
  Aborted { task: String, message: String },
}
