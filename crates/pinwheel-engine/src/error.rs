//! Engine errors and the failure taxonomy.

use std::error::Error as _;
use std::fmt;

use pinwheel_host_kv::KvError;
use pinwheel_host_secrets::SecretError;
use pinwheel_task_runtime::InvokeError;
use pinwheel_workflow::PathError;
use serde::{Deserialize, Serialize};

/// Classification of a failed execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
  /// A task exceeded its budget.
  Timeout,
  /// An external call failed for any other reason.
  InvocationError,
  /// A lookup key or secret id does not exist.
  NotFound,
  /// The secret store refused access.
  AccessDenied,
  /// A value had the wrong type, or was missing where a number was compared.
  TypeMismatch,
  /// The whole execution ran past its deadline.
  WorkflowTimeout,
  /// A looked-up record lacks a projected field.
  MalformedRecord,
  /// A path did not resolve, or a result could not be written.
  InvalidPath,
}

impl ErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      ErrorKind::Timeout => "Timeout",
      ErrorKind::InvocationError => "InvocationError",
      ErrorKind::NotFound => "NotFound",
      ErrorKind::AccessDenied => "AccessDenied",
      ErrorKind::TypeMismatch => "TypeMismatch",
      ErrorKind::WorkflowTimeout => "WorkflowTimeout",
      ErrorKind::MalformedRecord => "MalformedRecord",
      ErrorKind::InvalidPath => "InvalidPath",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Why a single step failed.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
  #[error(transparent)]
  Invoke(#[from] InvokeError),

  #[error("no item with key '{key}' in table '{table}'")]
  ItemNotFound { table: String, key: String },

  #[error("item '{key}' in table '{table}' is malformed")]
  MalformedRecord {
    table: String,
    key: String,
    #[source]
    source: PathError,
  },

  #[error("key-value lookup failed")]
  Kv(#[from] KvError),

  #[error("secret resolution failed")]
  Secret(#[from] SecretError),

  #[error("type mismatch: {message}")]
  TypeMismatch { message: String },

  #[error("path error")]
  Path(#[from] PathError),

  /// A detached call panicked or was dropped by the runtime.
  #[error("external call aborted: {message}")]
  Aborted { message: String },
}

impl StepError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      StepError::Invoke(InvokeError::Timeout { .. }) => ErrorKind::Timeout,
      StepError::Invoke(_) => ErrorKind::InvocationError,
      StepError::ItemNotFound { .. } => ErrorKind::NotFound,
      StepError::MalformedRecord { .. } => ErrorKind::MalformedRecord,
      StepError::Kv(_) => ErrorKind::InvocationError,
      StepError::Secret(SecretError::NotFound { .. }) => ErrorKind::NotFound,
      StepError::Secret(SecretError::AccessDenied { .. }) => ErrorKind::AccessDenied,
      StepError::Secret(SecretError::Backend { .. }) => ErrorKind::InvocationError,
      StepError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
      StepError::Path(_) => ErrorKind::InvalidPath,
      StepError::Aborted { .. } => ErrorKind::InvocationError,
    }
  }

  pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
    StepError::TypeMismatch {
      message: message.into(),
    }
  }

  /// The error message followed by every source, joined by `": "`.
  pub fn chain(&self) -> String {
    let mut message = self.to_string();
    let mut source = self.source();
    while let Some(cause) = source {
      message.push_str(": ");
      message.push_str(&cause.to_string());
      source = cause.source();
    }
    message
  }
}

/// A failed step, as reported in an execution result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
  pub step: String,
  pub kind: ErrorKind,
  pub message: String,
}

impl StepFailure {
  pub fn new(step: impl Into<String>, error: &StepError) -> Self {
    Self {
      step: step.into(),
      kind: error.kind(),
      message: error.chain(),
    }
  }
}

impl fmt::Display for StepFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "step '{}' failed with {}: {}", self.step, self.kind, self.message)
  }
}

/// Errors from the engine outside of a running execution.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  #[error("workflow '{workflow}' uses unregistered tasks: {}", .tasks.join(", "))]
  UnknownTasks { workflow: String, tasks: Vec<String> },

  #[error("workflow runner channel closed")]
  RunnerClosed,
}
