use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::TaskError;

/// An external unit of work.
///
/// Implementations are called once per step execution and must not retry
/// internally.
pub trait TaskInvoker: Send + Sync {
  fn invoke(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, TaskError>> + Send + '_>>;
}

/// A [`TaskInvoker`] backed by an async closure.
pub struct FnTask<F> {
  f: F,
}

/// Wrap an async closure as a task.
///
/// ```ignore
/// let double = task_fn(|input: Value| async move {
///   let n = input["n"].as_i64().ok_or_else(|| TaskError::invalid_input("n"))?;
///   Ok(json!({ "n": n * 2 }))
/// });
/// ```
pub fn task_fn<F, Fut>(f: F) -> FnTask<F>
where
  F: Fn(Value) -> Fut + Send + Sync,
  Fut: Future<Output = Result<Value, TaskError>> + Send + 'static,
{
  FnTask { f }
}

impl<F, Fut> TaskInvoker for FnTask<F>
where
  F: Fn(Value) -> Fut + Send + Sync,
  Fut: Future<Output = Result<Value, TaskError>> + Send + 'static,
{
  fn invoke(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, TaskError>> + Send + '_>> {
    Box::pin((self.f)(input))
  }
}
