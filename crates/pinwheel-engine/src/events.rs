//! Execution events and notifiers for observability.
//!
//! Events describe progress only. They never carry step inputs or outputs,
//! so a notifier cannot leak payload contents such as resolved secrets.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ErrorKind;

/// Events emitted during workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// Workflow execution has started.
  WorkflowStarted {
    execution_id: String,
    workflow: String,
  },

  /// A step has started executing.
  StepStarted {
    execution_id: String,
    step: String,
    step_type: String,
  },

  /// A step has completed. `next` is `None` for a terminal step.
  StepCompleted {
    execution_id: String,
    step: String,
    next: Option<String>,
  },

  /// A step has failed.
  StepFailed {
    execution_id: String,
    step: String,
    kind: ErrorKind,
    error: String,
  },

  /// Workflow execution has completed successfully.
  WorkflowSucceeded { execution_id: String },

  /// Workflow execution has failed.
  WorkflowFailed {
    execution_id: String,
    kind: ErrorKind,
    error: String,
  },

  /// Workflow execution ran out of time.
  WorkflowTimedOut {
    execution_id: String,
    step: Option<String>,
  },
}

impl ExecutionEvent {
  pub fn execution_id(&self) -> &str {
    match self {
      ExecutionEvent::WorkflowStarted { execution_id, .. }
      | ExecutionEvent::StepStarted { execution_id, .. }
      | ExecutionEvent::StepCompleted { execution_id, .. }
      | ExecutionEvent::StepFailed { execution_id, .. }
      | ExecutionEvent::WorkflowSucceeded { execution_id }
      | ExecutionEvent::WorkflowFailed { execution_id, .. }
      | ExecutionEvent::WorkflowTimedOut { execution_id, .. } => execution_id,
    }
  }
}

/// Trait for receiving execution events.
///
/// The engine calls `notify` for each event; implementations decide what to
/// do with them.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // NOTE: unbounded so a slow consumer never stalls an execution. Volume is
  // a handful of events per step.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
