use thiserror::Error;

use crate::path::PathError;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("state machine '{0}' has no steps")]
  Empty(String),

  #[error("step name must not be empty")]
  EmptyStepName,

  #[error("duplicate step name: {0}")]
  DuplicateStep(String),

  #[error("entry step not found: {0}")]
  UnknownEntry(String),

  #[error("step '{step}' transitions to unknown step '{target}'")]
  UnknownSuccessor { step: String, target: String },

  #[error("invalid {field} on step '{step}'")]
  InvalidPath {
    step: String,
    field: &'static str,
    #[source]
    source: PathError,
  },

  #[error("choice step '{0}' has no rules")]
  EmptyChoice(String),

  #[error("invalid duration on {owner}: {message}")]
  InvalidDuration { owner: String, message: String },

  #[error("steps not reachable from the entry step: {}", .steps.join(", "))]
  Unreachable { steps: Vec<String> },
}
