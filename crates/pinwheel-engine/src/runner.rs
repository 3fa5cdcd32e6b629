//! Workflow runner with channel-based triggering.
//!
//! The `WorkflowRunner` owns an mpsc channel for receiving trigger payloads
//! and runs one execution of its workflow per payload.

use std::sync::Arc;

use pinwheel_workflow::Workflow;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::engine::WorkflowEngine;
use crate::error::EngineError;
use crate::events::ExecutionNotifier;
use crate::result::{ExecutionResult, TerminalState};

/// How the executions a runner started have ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerStats {
  pub succeeded: usize,
  pub failed: usize,
  pub timed_out: usize,
  /// Executions whose task panicked before producing a result.
  pub panicked: usize,
}

impl RunnerStats {
  pub fn total(&self) -> usize {
    self.succeeded + self.failed + self.timed_out + self.panicked
  }

  fn record(&mut self, workflow: &str, joined: Result<ExecutionResult, JoinError>) {
    match joined {
      Ok(result) => {
        info!(
          workflow = %workflow,
          execution_id = %result.execution_id,
          state = ?result.state(),
          "workflow execution finished"
        );
        match result.state() {
          TerminalState::Succeeded => self.succeeded += 1,
          TerminalState::Failed => self.failed += 1,
          TerminalState::TimedOut => self.timed_out += 1,
        }
      }
      Err(e) => {
        error!(workflow = %workflow, error = %e, "workflow execution panicked");
        self.panicked += 1;
      }
    }
  }
}

/// A runner that executes a workflow in response to trigger payloads.
///
/// # Usage
///
/// ```ignore
/// let runner = WorkflowRunner::new(engine, workflow);
///
/// // Get sender for external triggers
/// let sender = runner.sender();
///
/// // Start the execution loop
/// let cancel = CancellationToken::new();
/// let stats = runner.start(cancel).await;
/// ```
pub struct WorkflowRunner<N: ExecutionNotifier + 'static> {
  sender: mpsc::Sender<Value>,
  receiver: mpsc::Receiver<Value>,
  engine: Arc<WorkflowEngine<N>>,
  workflow: Arc<Workflow>,
}

impl<N: ExecutionNotifier + 'static> WorkflowRunner<N> {
  /// Create a new workflow runner.
  pub fn new(engine: Arc<WorkflowEngine<N>>, workflow: Arc<Workflow>) -> Self {
    Self::with_buffer_size(engine, workflow, 100)
  }

  /// Create a new workflow runner with a custom buffer size.
  pub fn with_buffer_size(
    engine: Arc<WorkflowEngine<N>>,
    workflow: Arc<Workflow>,
    buffer_size: usize,
  ) -> Self {
    let (sender, receiver) = mpsc::channel(buffer_size);
    Self {
      sender,
      receiver,
      engine,
      workflow,
    }
  }

  /// Get a sender handle for triggering workflow executions.
  pub fn sender(&self) -> mpsc::Sender<Value> {
    self.sender.clone()
  }

  /// Trigger a workflow execution with the given payload.
  pub async fn run(&self, payload: Value) -> Result<(), EngineError> {
    self
      .sender
      .send(payload)
      .await
      .map_err(|_| EngineError::RunnerClosed)
  }

  /// Start the execution loop.
  ///
  /// Each received payload starts a concurrent execution, and finished
  /// executions are collected as they complete. The loop stops accepting
  /// payloads when the token is cancelled or every sender is dropped, then
  /// waits for the executions already started.
  pub async fn start(self, cancel: CancellationToken) -> RunnerStats {
    let WorkflowRunner {
      sender,
      mut receiver,
      engine,
      workflow,
    } = self;
    // Only external senders keep the channel open
    drop(sender);

    info!(workflow = %workflow.name(), "starting workflow runner");

    let mut stats = RunnerStats::default();
    let mut executions = JoinSet::new();
    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!(workflow = %workflow.name(), "workflow runner cancelled");
          break;
        }
        Some(joined) = executions.join_next(), if !executions.is_empty() => {
          stats.record(workflow.name(), joined);
        }
        payload = receiver.recv() => {
          match payload {
            Some(payload) => {
              info!(workflow = %workflow.name(), "triggering workflow execution");
              let engine = engine.clone();
              let workflow = workflow.clone();
              executions.spawn(async move { engine.execute(&workflow, payload).await });
            }
            None => {
              info!(workflow = %workflow.name(), "workflow runner channel closed");
              break;
            }
          }
        }
      }
    }

    while let Some(joined) = executions.join_next().await {
      stats.record(workflow.name(), joined);
    }

    info!(
      workflow = %workflow.name(),
      succeeded = stats.succeeded,
      failed = stats.failed,
      timed_out = stats.timed_out,
      panicked = stats.panicked,
      "workflow runner stopped"
    );
    stats
  }

  /// Execute a single workflow run directly, without the channel.
  pub async fn execute_once(&self, payload: Value) -> ExecutionResult {
    self.engine.execute(&self.workflow, payload).await
  }

  pub fn workflow(&self) -> &Workflow {
    &self.workflow
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::EngineConfig;
  use crate::engine::Capabilities;
  use pinwheel_config::StateMachineDef;
  use pinwheel_host_kv::InMemoryKvStore;
  use pinwheel_host_secrets::InMemorySecretStore;
  use pinwheel_task_runtime::{TaskRegistry, task_fn};
  use crate::wait::Waiter;
  use serde_json::json;
  use std::future::Future;
  use std::pin::Pin;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  fn create_test_runner() -> WorkflowRunner<crate::events::NoopNotifier> {
    let def: StateMachineDef = serde_json::from_value(json!({
      "name": "echo",
      "start_at": "echo",
      "steps": [
        { "name": "echo", "type": "task", "task": "Echo", "result_path": "$.echoed" }
      ]
    }))
    .unwrap();
    let workflow = Arc::new(Workflow::lock(&def).unwrap());

    let tasks = TaskRegistry::new().with(
      "Echo",
      task_fn(|input: Value| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(input)
      }),
    );
    let capabilities = Capabilities::new(
      tasks,
      Arc::new(InMemoryKvStore::new()),
      Arc::new(InMemorySecretStore::new()),
    );
    let engine = Arc::new(WorkflowEngine::new(EngineConfig::default(), capabilities));
    WorkflowRunner::new(engine, workflow)
  }

  #[tokio::test]
  async fn test_sender_cloning() {
    let runner = create_test_runner();

    let sender1 = runner.sender();
    let sender2 = runner.sender();

    assert!(!sender1.is_closed());
    assert!(!sender2.is_closed());
    assert_eq!(runner.workflow().name(), "echo");
  }

  #[tokio::test]
  async fn test_run_sends_to_channel() {
    let mut runner = create_test_runner();

    runner.run(json!({"test": "data"})).await.unwrap();

    let received = runner.receiver.recv().await;
    assert_eq!(received.unwrap()["test"], "data");
  }

  #[tokio::test]
  async fn test_execute_once() {
    let runner = create_test_runner();
    let result = runner.execute_once(json!({"n": 1})).await;

    assert_eq!(result.state(), TerminalState::Succeeded);
    assert_eq!(result.output(), Some(&json!({"n": 1, "echoed": {"n": 1}})));
  }

  #[tokio::test(start_paused = true)]
  async fn test_drains_executions_when_channel_closes() {
    let runner = create_test_runner();
    let sender = runner.sender();

    for n in 0..3 {
      sender.send(json!({ "n": n })).await.unwrap();
    }
    drop(sender);

    let stats = runner.start(CancellationToken::new()).await;
    assert_eq!(stats.succeeded, 3);
    assert_eq!(stats.total(), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_collects_executions_while_accepting() {
    let runner = create_test_runner();
    let sender = runner.sender();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(runner.start(cancel.clone()));

    for n in 0..5 {
      sender.send(json!({ "n": n })).await.unwrap();
      tokio::time::sleep(Duration::from_millis(100)).await;
    }
    cancel.cancel();

    let stats = handle.await.unwrap();
    assert_eq!(stats.succeeded, 5);
    assert_eq!(stats.total(), 5);
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancellation_drains_in_flight_executions() {
    let runner = create_test_runner();
    let sender = runner.sender();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(runner.start(cancel.clone()));

    sender.send(json!({ "n": 1 })).await.unwrap();
    // The echo task sleeps for 50ms, so the execution is still running
    tokio::time::sleep(Duration::from_millis(10)).await;
    cancel.cancel();

    let stats = handle.await.unwrap();
    assert_eq!(stats.succeeded, 1);
  }

  /// Panics on its first wait and sleeps normally afterwards.
  struct PanicOnce {
    calls: AtomicUsize,
  }

  impl Waiter for PanicOnce {
    fn wait(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
      let first = self.calls.fetch_add(1, Ordering::SeqCst) == 0;
      Box::pin(async move {
        if first {
          panic!("waiter failed");
        }
        tokio::time::sleep(duration).await;
      })
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_panicked_execution_does_not_stop_others() {
    let def: StateMachineDef = serde_json::from_value(json!({
      "name": "pause",
      "start_at": "pause",
      "steps": [{ "name": "pause", "type": "wait", "seconds": 1 }]
    }))
    .unwrap();
    let workflow = Arc::new(Workflow::lock(&def).unwrap());
    let capabilities = Capabilities::new(
      TaskRegistry::new(),
      Arc::new(InMemoryKvStore::new()),
      Arc::new(InMemorySecretStore::new()),
    )
    .with_waiter(Arc::new(PanicOnce {
      calls: AtomicUsize::new(0),
    }));
    let engine = Arc::new(WorkflowEngine::new(EngineConfig::default(), capabilities));
    let runner = WorkflowRunner::new(engine, workflow);
    let sender = runner.sender();

    for n in 0..3 {
      sender.send(json!({ "n": n })).await.unwrap();
    }
    drop(sender);

    let stats = runner.start(CancellationToken::new()).await;
    assert_eq!(stats.panicked, 1);
    assert_eq!(stats.succeeded, 2);
  }

  #[tokio::test]
  async fn test_cancellation() {
    let runner = create_test_runner();
    let _sender = runner.sender();

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    let handle = tokio::spawn(async move { runner.start(cancel_clone).await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    cancel.cancel();

    let stats = handle.await.unwrap();
    assert_eq!(stats, RunnerStats::default());
  }
}
