//! Choice routing.

use pinwheel_workflow::{ChoiceRule, ChoiceStep, Operand, Path, StepId};
use serde_json::Value;

use crate::error::StepError;

/// Picks the successor of a choice step.
///
/// Rules are evaluated in order and the first match wins; the default
/// successor is taken only when every rule evaluated to false. A rule whose
/// variable or operand is missing or not a number fails the step instead of
/// falling through to the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoiceRouter;

impl ChoiceRouter {
  pub fn route(choice: &ChoiceStep, input: &Value) -> Result<StepId, StepError> {
    for rule in &choice.rules {
      if Self::matches(rule, input)? {
        return Ok(rule.next);
      }
    }
    Ok(choice.default)
  }

  fn matches(rule: &ChoiceRule, input: &Value) -> Result<bool, StepError> {
    let left = number_at(&rule.variable, input)?;
    let right = match &rule.operand {
      Operand::Path(path) => number_at(path, input)?,
      Operand::Value(value) => *value,
    };
    Ok(rule.comparison.holds(left, right))
  }
}

fn number_at(path: &Path, input: &Value) -> Result<f64, StepError> {
  let value = path
    .resolve(input)
    .ok_or_else(|| StepError::type_mismatch(format!("'{}' is missing, expected a number", path)))?;
  value.as_f64().ok_or_else(|| {
    StepError::type_mismatch(format!(
      "'{}' is {}, expected a number",
      path,
      json_type(value)
    ))
  })
}

pub(crate) fn json_type(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}
