//! The payload threaded through one execution, and step I/O processing.
//!
//! For steps that produce a result (task, lookup, secret):
//!
//! ```text
//! context ─input_path─▶ input ─(parameters)─▶ call ─result_selector─▶ result
//! context + result ─result_path─▶ merged ─output_path─▶ next context
//! ```
//!
//! Wait and choice steps only apply `input_path` and then `output_path`.

use pinwheel_workflow::{PathError, ResultPath, Step, Template};
use serde_json::Value;

use crate::error::StepError;

/// The JSON payload owned by one in-flight execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
  payload: Value,
}

impl ExecutionContext {
  pub fn new(payload: Value) -> Self {
    Self { payload }
  }

  pub fn payload(&self) -> &Value {
    &self.payload
  }

  pub fn into_payload(self) -> Value {
    self.payload
  }

  /// The part of the context a step reads, per its `input_path`.
  pub fn input(&self, step: &Step) -> Result<Value, StepError> {
    Ok(step.input_path.apply(&self.payload)?)
  }

  /// Merge a step result into the context the step started from, then apply
  /// the step's `output_path`.
  ///
  /// The context is left untouched on error.
  pub fn complete_with_result(
    &mut self,
    step: &Step,
    result_path: &ResultPath,
    result: Value,
  ) -> Result<(), StepError> {
    let merged = result_path.merge(self.payload.clone(), result)?;
    self.payload = step.output_path.apply(&merged)?;
    Ok(())
  }

  /// Pass a step's input on as the next context, per its `output_path`.
  pub fn complete_passthrough(&mut self, step: &Step, input: &Value) -> Result<(), StepError> {
    self.payload = step.output_path.apply(input)?;
    Ok(())
  }
}

/// Apply an optional result selector to a raw result.
pub fn select_result(selector: Option<&Template>, raw: Value) -> Result<Value, PathError> {
  match selector {
    Some(template) => template.render(&raw),
    None => Ok(raw),
  }
}
