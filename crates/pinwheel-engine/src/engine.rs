//! Workflow execution engine.
//!
//! The `WorkflowEngine` walks a locked workflow one step at a time, from the
//! entry step until a step without successor completes, a step fails, or the
//! execution deadline passes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pinwheel_host_kv::KvStore;
use pinwheel_host_secrets::SecretStore;
use pinwheel_task_runtime::TaskRegistry;
use pinwheel_workflow::{
  LookupStep, SecretStep, Step, StepId, StepKind, TaskStep, ValueSource, Workflow,
};
use serde_json::{Value, json};
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::choice::{ChoiceRouter, json_type};
use crate::config::EngineConfig;
use crate::context::{ExecutionContext, select_result};
use crate::error::{EngineError, StepError, StepFailure};
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::result::{ExecutionResult, TerminalResult};
use crate::wait::{TokioWaiter, Waiter};

/// The external collaborators an engine calls into.
#[derive(Clone)]
pub struct Capabilities {
  pub tasks: TaskRegistry,
  pub kv: Arc<dyn KvStore>,
  pub secrets: Arc<dyn SecretStore>,
  pub waiter: Arc<dyn Waiter>,
}

impl Capabilities {
  /// Capabilities that wait on the tokio timer.
  pub fn new(tasks: TaskRegistry, kv: Arc<dyn KvStore>, secrets: Arc<dyn SecretStore>) -> Self {
    Self {
      tasks,
      kv,
      secrets,
      waiter: Arc::new(TokioWaiter),
    }
  }

  pub fn with_waiter(mut self, waiter: Arc<dyn Waiter>) -> Self {
    self.waiter = waiter;
    self
  }
}

/// Where an execution is. Kept outside the step loop so the timeout path
/// can report the step that was in flight.
struct Progress {
  current: StepId,
  context: ExecutionContext,
  visited: Vec<String>,
}

/// The workflow execution engine.
///
/// Generic over `N: ExecutionNotifier` to allow different notification strategies.
/// Use `WorkflowEngine::new()` for an engine with no-op notifications,
/// or `WorkflowEngine::with_notifier()` to provide a custom notifier.
///
/// One engine can run any number of executions concurrently; each execution
/// owns its context.
pub struct WorkflowEngine<N: ExecutionNotifier = NoopNotifier> {
  config: EngineConfig,
  capabilities: Capabilities,
  notifier: N,
}

impl WorkflowEngine<NoopNotifier> {
  /// Create a new workflow engine with no-op notifications.
  pub fn new(config: EngineConfig, capabilities: Capabilities) -> Self {
    Self::with_notifier(config, capabilities, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> WorkflowEngine<N> {
  /// Create a new workflow engine with a custom notifier.
  pub fn with_notifier(config: EngineConfig, capabilities: Capabilities, notifier: N) -> Self {
    Self {
      config,
      capabilities,
      notifier,
    }
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn capabilities(&self) -> &Capabilities {
    &self.capabilities
  }

  /// Check that every task the workflow names is registered.
  pub fn check(&self, workflow: &Workflow) -> Result<(), EngineError> {
    let missing: Vec<String> = workflow
      .task_names()
      .into_iter()
      .filter(|task| !self.capabilities.tasks.contains(task))
      .map(str::to_string)
      .collect();

    if missing.is_empty() {
      Ok(())
    } else {
      Err(EngineError::UnknownTasks {
        workflow: workflow.name().to_string(),
        tasks: missing,
      })
    }
  }

  /// Execute a workflow with its own timeout, or the configured default.
  pub async fn execute(&self, workflow: &Workflow, payload: Value) -> ExecutionResult {
    let timeout = workflow.timeout().unwrap_or(self.config.default_timeout);
    self.execute_with_timeout(workflow, payload, timeout).await
  }

  /// Execute a workflow under an explicit timeout.
  pub async fn execute_with_timeout(
    &self,
    workflow: &Workflow,
    payload: Value,
    timeout: Duration,
  ) -> ExecutionResult {
    let execution_id = uuid::Uuid::new_v4().to_string();
    self.run(workflow, payload, timeout, execution_id).await
  }

  #[instrument(
    name = "workflow_execute",
    skip_all,
    fields(
      workflow = %workflow.name(),
      execution_id = %execution_id,
    )
  )]
  async fn run(
    &self,
    workflow: &Workflow,
    payload: Value,
    timeout: Duration,
    execution_id: String,
  ) -> ExecutionResult {
    let started = Instant::now();
    // A timeout too large for the clock never expires
    let deadline = started.checked_add(timeout);

    info!(
      execution_id = %execution_id,
      workflow = %workflow.name(),
      timeout_ms = timeout.as_millis() as u64,
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.clone(),
      workflow: workflow.name().to_string(),
    });

    let mut progress = Progress {
      current: workflow.entry(),
      context: ExecutionContext::new(payload),
      visited: Vec::new(),
    };

    let steps = self.run_loop(workflow, &execution_id, &mut progress);
    let outcome = match deadline {
      Some(deadline) => tokio::time::timeout_at(deadline, steps).await,
      None => Ok(steps.await),
    };
    let past_deadline = deadline.is_some_and(|deadline| Instant::now() >= deadline);

    let result = match outcome {
      // A result that lands on or after the deadline is discarded
      Ok(_) if past_deadline => self.timed_out(workflow, &execution_id, &progress, timeout),
      Ok(Ok(output)) => {
        info!(execution_id = %execution_id, "workflow_succeeded");
        self.notifier.notify(ExecutionEvent::WorkflowSucceeded {
          execution_id: execution_id.clone(),
        });
        TerminalResult::Succeeded { output }
      }
      Ok(Err(failure)) => {
        error!(
          execution_id = %execution_id,
          step = %failure.step,
          kind = %failure.kind,
          error = %failure.message,
          "workflow_failed"
        );
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id: execution_id.clone(),
          kind: failure.kind,
          error: failure.to_string(),
        });
        TerminalResult::Failed { failure }
      }
      Err(_) => self.timed_out(workflow, &execution_id, &progress, timeout),
    };

    ExecutionResult {
      execution_id,
      workflow: workflow.name().to_string(),
      visited: progress.visited,
      elapsed: started.elapsed(),
      result,
    }
  }

  fn timed_out(
    &self,
    workflow: &Workflow,
    execution_id: &str,
    progress: &Progress,
    timeout: Duration,
  ) -> TerminalResult {
    let step = workflow.step(progress.current).name.clone();
    warn!(
      execution_id = %execution_id,
      step = %step,
      timeout_ms = timeout.as_millis() as u64,
      "workflow_timed_out"
    );
    self.notifier.notify(ExecutionEvent::WorkflowTimedOut {
      execution_id: execution_id.to_string(),
      step: Some(step.clone()),
    });
    TerminalResult::TimedOut {
      step: Some(step),
      timeout,
    }
  }

  /// Run steps until one has no successor or one fails.
  async fn run_loop(
    &self,
    workflow: &Workflow,
    execution_id: &str,
    progress: &mut Progress,
  ) -> Result<Value, StepFailure> {
    loop {
      let step = workflow.step(progress.current);
      progress.visited.push(step.name.clone());

      self.notifier.notify(ExecutionEvent::StepStarted {
        execution_id: execution_id.to_string(),
        step: step.name.clone(),
        step_type: step.kind.type_name().to_string(),
      });

      match self.run_step(step, execution_id, &mut progress.context).await {
        Ok(next) => {
          let next_name = next.map(|id| workflow.step(id).name.clone());
          info!(
            execution_id = %execution_id,
            step = %step.name,
            next = next_name.as_deref().unwrap_or("<end>"),
            "step_completed"
          );
          self.notifier.notify(ExecutionEvent::StepCompleted {
            execution_id: execution_id.to_string(),
            step: step.name.clone(),
            next: next_name,
          });

          match next {
            Some(next) => progress.current = next,
            None => return Ok(std::mem::take(&mut progress.context).into_payload()),
          }
        }
        Err(err) => {
          let failure = StepFailure::new(&step.name, &err);
          error!(
            execution_id = %execution_id,
            step = %step.name,
            kind = %failure.kind,
            error = %failure.message,
            "step_failed"
          );
          self.notifier.notify(ExecutionEvent::StepFailed {
            execution_id: execution_id.to_string(),
            step: step.name.clone(),
            kind: failure.kind,
            error: failure.message.clone(),
          });
          return Err(failure);
        }
      }
    }
  }

  /// Execute one step against the context and return its successor.
  #[instrument(
    name = "step_execute",
    skip_all,
    fields(
      execution_id = %execution_id,
      step = %step.name,
      step_type = step.kind.type_name(),
    )
  )]
  async fn run_step(
    &self,
    step: &Step,
    execution_id: &str,
    context: &mut ExecutionContext,
  ) -> Result<Option<StepId>, StepError> {
    info!(execution_id = %execution_id, step = %step.name, "step_started");

    let input = context.input(step)?;
    match &step.kind {
      StepKind::Task(task) => {
        let result = self.invoke_task(task, input).await?;
        let selected = select_result(task.result.result_selector.as_ref(), result)?;
        context.complete_with_result(step, &task.result.result_path, selected)?;
        Ok(step.next)
      }
      StepKind::Lookup(lookup) => {
        let selected = self.lookup(lookup, &input).await?;
        context.complete_with_result(step, &lookup.result.result_path, selected)?;
        Ok(step.next)
      }
      StepKind::Secret(secret) => {
        let result = self.resolve_secret(secret, &input).await?;
        let selected = select_result(secret.result.result_selector.as_ref(), result)?;
        context.complete_with_result(step, &secret.result.result_path, selected)?;
        Ok(step.next)
      }
      StepKind::Wait(wait) => {
        self.capabilities.waiter.wait(wait.duration).await;
        context.complete_passthrough(step, &input)?;
        Ok(step.next)
      }
      StepKind::Choice(choice) => {
        let next = ChoiceRouter::route(choice, &input)?;
        context.complete_passthrough(step, &input)?;
        Ok(Some(next))
      }
    }
  }

  async fn invoke_task(&self, task: &TaskStep, input: Value) -> Result<Value, StepError> {
    let payload = match &task.parameters {
      Some(parameters) => parameters.render(&input)?,
      None => input,
    };
    let budget = task.timeout.unwrap_or(self.config.default_task_timeout);
    Ok(self.capabilities.tasks.invoke(&task.task, payload, budget).await?)
  }

  /// Fetch the item and project it through the result selector.
  ///
  /// The selector sees `{ "Item": <item> }`. A selector path that does not
  /// resolve means the record lacks a field.
  async fn lookup(&self, lookup: &LookupStep, input: &Value) -> Result<Value, StepError> {
    let key = string_argument(&lookup.key, input, "lookup key")?;

    let kv = self.capabilities.kv.clone();
    let table = lookup.table.clone();
    let key_attribute = lookup.key_attribute.clone();
    let item_key = key.clone();
    let item = detached(async move { kv.get_item(&table, &key_attribute, &item_key).await })
      .await??
      .ok_or_else(|| StepError::ItemNotFound {
        table: lookup.table.clone(),
        key: key.clone(),
      })?;

    let exposed = json!({ "Item": Value::Object(item) });
    match &lookup.result.result_selector {
      Some(selector) => selector
        .render(&exposed)
        .map_err(|source| StepError::MalformedRecord {
          table: lookup.table.clone(),
          key,
          source,
        }),
      None => Ok(exposed),
    }
  }

  /// Resolve a secret into `{ "Name": id, "SecretString": value }`.
  ///
  /// This is the only place a secret value is exposed, and it goes straight
  /// into the context.
  async fn resolve_secret(&self, secret: &SecretStep, input: &Value) -> Result<Value, StepError> {
    let secret_id = string_argument(&secret.secret_id, input, "secret id")?;

    let store = self.capabilities.secrets.clone();
    let id = secret_id.clone();
    let value = detached(async move { store.get_secret(&id).await }).await??;

    Ok(json!({
      "Name": secret_id,
      "SecretString": value.into_exposed(),
    }))
  }
}

/// Resolve a step argument that must be a string.
fn string_argument(source: &ValueSource, input: &Value, what: &str) -> Result<String, StepError> {
  match source.resolve(input)? {
    Value::String(value) => Ok(value),
    other => Err(StepError::type_mismatch(format!(
      "{} must be a string, found {}",
      what,
      json_type(&other)
    ))),
  }
}

/// Run an external call on its own task, so that an execution timeout drops
/// only the wait and never the call.
async fn detached<T, F>(call: F) -> Result<T, StepError>
where
  F: Future<Output = T> + Send + 'static,
  T: Send + 'static,
{
  tokio::spawn(call).await.map_err(|e| StepError::Aborted {
    message: e.to_string(),
  })
}
