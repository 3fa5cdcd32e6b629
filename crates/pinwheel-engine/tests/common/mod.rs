#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pinwheel_config::preset;
use pinwheel_engine::{
  Capabilities, ChannelNotifier, EngineConfig, ExecutionEvent, WorkflowEngine,
};
use pinwheel_host_kv::{InMemoryKvStore, WorkflowRecord};
use pinwheel_host_secrets::{InMemorySecretStore, SecretError, SecretStore, SecretValue};
use pinwheel_task_runtime::{TaskError, TaskRegistry, task_fn};
use pinwheel_workflow::Workflow;
use serde_json::{Value, json};
use tokio::sync::mpsc;

pub const API_KEY_ID: &str = "jurassic-1-api-key";
pub const API_KEY_VALUE: &str = "sk-live-0123456789";
pub const API_ENDPOINT: &str = "https://api.ai21.com/studio/v1/j1-jumbo/complete";

pub fn record() -> WorkflowRecord {
  WorkflowRecord {
    api_endpoint: API_ENDPOINT.to_string(),
    api_key_id: API_KEY_ID.to_string(),
    prompt_sequence: vec![
      "outline".to_string(),
      "draft".to_string(),
      "summary".to_string(),
    ],
  }
}

pub fn preset_workflow() -> Workflow {
  Workflow::lock(&preset::random_number_state_machine()).unwrap()
}

pub fn scenario(generated: Value, threshold: Value) -> Value {
  let mut context = serde_json::Map::new();
  context.insert(preset::GENERATED_FIELD.to_string(), generated);
  context.insert(preset::THRESHOLD_FIELD.to_string(), threshold);
  Value::Object(context)
}

/// Secret store wrapper that counts lookups.
pub struct CountingSecrets {
  inner: InMemorySecretStore,
  pub calls: AtomicUsize,
}

impl SecretStore for CountingSecrets {
  fn get_secret(
    &self,
    secret_id: &str,
  ) -> Pin<Box<dyn Future<Output = Result<SecretValue, SecretError>> + Send + '_>> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.inner.get_secret(secret_id)
  }
}

/// In-memory collaborators for the random number state machine.
pub struct Harness {
  pub kv: Arc<InMemoryKvStore>,
  pub secrets: Arc<CountingSecrets>,
  /// Names of the tasks invoked, in order.
  pub invoked: Arc<Mutex<Vec<String>>>,
  pub config: EngineConfig,
}

impl Harness {
  /// Table, record and secret all present.
  pub fn seeded() -> Self {
    let harness = Self::empty();
    let table = preset::table_name(preset::DEFAULT_STAGE);
    harness.kv.create_table(&table, preset::KEY_ATTRIBUTE);
    harness
      .kv
      .put_record(&table, preset::DEFAULT_WORKFLOW_KEY, &record())
      .unwrap();
    harness.secrets.inner.insert(API_KEY_ID, API_KEY_VALUE);
    harness
  }

  /// No tables and no secrets.
  pub fn empty() -> Self {
    Self {
      kv: Arc::new(InMemoryKvStore::new()),
      secrets: Arc::new(CountingSecrets {
        inner: InMemorySecretStore::new(),
        calls: AtomicUsize::new(0),
      }),
      invoked: Arc::new(Mutex::new(Vec::new())),
      config: EngineConfig::default(),
    }
  }

  pub fn deny_secret(&self, secret_id: &str) {
    self.secrets.inner.deny(secret_id);
  }

  pub fn secret_calls(&self) -> usize {
    self.secrets.calls.load(Ordering::SeqCst)
  }

  pub fn invoked(&self) -> Vec<String> {
    self.invoked.lock().unwrap().clone()
  }

  /// Tasks of the random number state machine.
  ///
  /// The generator echoes its input, so each test picks the numbers the
  /// choice step sees. The branch tasks tag the context with their branch.
  pub fn tasks(&self) -> TaskRegistry {
    TaskRegistry::new()
      .with(preset::GENERATE_TASK, self.recording(preset::GENERATE_TASK, |input| Ok(input)))
      .with(
        preset::GREATER_TASK,
        self.recording(preset::GREATER_TASK, |input| Ok(tag(input, "greater"))),
      )
      .with(
        preset::LESSER_TASK,
        self.recording(preset::LESSER_TASK, |input| Ok(tag(input, "lesser"))),
      )
  }

  /// Wrap a synchronous task body so each call is recorded.
  pub fn recording<F>(&self, name: &str, body: F) -> impl pinwheel_task_runtime::TaskInvoker + 'static
  where
    F: Fn(Value) -> Result<Value, TaskError> + Send + Sync + 'static,
  {
    let invoked = self.invoked.clone();
    let name = name.to_string();
    let body = Arc::new(body);
    task_fn(move |input: Value| {
      invoked.lock().unwrap().push(name.clone());
      let body = body.clone();
      async move { body(input) }
    })
  }

  /// A task that sleeps before echoing its input.
  pub fn sleeping(&self, name: &str, duration: Duration) -> impl pinwheel_task_runtime::TaskInvoker + 'static {
    let invoked = self.invoked.clone();
    let name = name.to_string();
    task_fn(move |input: Value| {
      invoked.lock().unwrap().push(name.clone());
      async move {
        tokio::time::sleep(duration).await;
        Ok(input)
      }
    })
  }

  pub fn capabilities(&self, tasks: TaskRegistry) -> Capabilities {
    Capabilities::new(tasks, self.kv.clone(), self.secrets.clone())
  }

  pub fn engine(&self, tasks: TaskRegistry) -> (WorkflowEngine<ChannelNotifier>, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (notifier, events) = ChannelNotifier::channel();
    let engine = WorkflowEngine::with_notifier(self.config.clone(), self.capabilities(tasks), notifier);
    (engine, events)
  }
}

fn tag(mut input: Value, branch: &str) -> Value {
  if let Some(object) = input.as_object_mut() {
    object.insert("branch".to_string(), json!(branch));
  }
  input
}

pub fn drain(events: &mut mpsc::UnboundedReceiver<ExecutionEvent>) -> Vec<ExecutionEvent> {
  let mut out = Vec::new();
  while let Ok(event) = events.try_recv() {
    out.push(event);
  }
  out
}
