use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::InvokeError;
use crate::invoker::TaskInvoker;

/// Named task implementations.
#[derive(Clone, Default)]
pub struct TaskRegistry {
  tasks: HashMap<String, Arc<dyn TaskInvoker>>,
}

impl TaskRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a task, replacing any previous task with the same name.
  pub fn register(&mut self, name: impl Into<String>, task: impl TaskInvoker + 'static) {
    self.tasks.insert(name.into(), Arc::new(task));
  }

  /// Builder-style [`TaskRegistry::register`].
  pub fn with(mut self, name: impl Into<String>, task: impl TaskInvoker + 'static) -> Self {
    self.register(name, task);
    self
  }

  pub fn get(&self, name: &str) -> Option<Arc<dyn TaskInvoker>> {
    self.tasks.get(name).cloned()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.tasks.contains_key(name)
  }

  /// Registered task names, sorted.
  pub fn names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.tasks.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }

  /// Invoke a task once, bounded by `budget`.
  ///
  /// The call runs on its own tokio task. When the budget runs out the call
  /// is left running in the background and its result is discarded.
  #[instrument(name = "task_invoke", skip_all, fields(task = %name, budget = ?budget))]
  pub async fn invoke(&self, name: &str, input: Value, budget: Duration) -> Result<Value, InvokeError> {
    let task = self.get(name).ok_or_else(|| InvokeError::UnknownTask {
      task: name.to_string(),
    })?;

    let handle = tokio::spawn(async move { task.invoke(input).await });

    match tokio::time::timeout(budget, handle).await {
      Ok(Ok(Ok(output))) => {
        debug!("task returned");
        Ok(output)
      }
      Ok(Ok(Err(source))) => Err(InvokeError::Failed {
        task: name.to_string(),
        source,
      }),
      Ok(Err(join_error)) => Err(InvokeError::Aborted {
        task: name.to_string(),
        message: join_error.to_string(),
      }),
      Err(_) => {
        warn!("task exceeded its budget, abandoning call");
        Err(InvokeError::Timeout {
          task: name.to_string(),
          budget,
        })
      }
    }
  }
}

impl std::fmt::Debug for TaskRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TaskRegistry")
      .field("tasks", &self.names())
      .finish()
  }
}
