use std::fmt;
use std::time::Duration;

use pinwheel_config::Comparison;
use serde_json::{Map, Value};

use crate::path::{Path, PathError};
use crate::template::Template;

/// Index of a step inside a locked [`crate::Workflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub(crate) usize);

impl StepId {
  pub fn index(self) -> usize {
    self.0
  }
}

impl fmt::Display for StepId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Input or output path of a step.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
  Path(Path),
  /// Pass `{}` instead of any data.
  Discard,
}

impl Selector {
  pub fn apply(&self, value: &Value) -> Result<Value, PathError> {
    match self {
      Selector::Path(path) if path.is_root() => Ok(value.clone()),
      Selector::Path(path) => path.select(value),
      Selector::Discard => Ok(Value::Object(Map::new())),
    }
  }
}

/// Where a step result is merged into the step input.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultPath {
  Path(Path),
  /// Drop the result and pass the input through.
  Discard,
}

impl ResultPath {
  /// Merge `result` into `input`. Only the subtree at the path changes.
  pub fn merge(&self, mut input: Value, result: Value) -> Result<Value, PathError> {
    match self {
      ResultPath::Path(path) => {
        path.write(&mut input, result)?;
        Ok(input)
      }
      ResultPath::Discard => Ok(input),
    }
  }
}

/// A scalar step argument: a literal or a path into the step input.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSource {
  Literal(String),
  Path(Path),
}

impl ValueSource {
  pub fn resolve(&self, input: &Value) -> Result<Value, PathError> {
    match self {
      ValueSource::Literal(value) => Ok(Value::String(value.clone())),
      ValueSource::Path(path) => path.select(input),
    }
  }
}

/// Post-processing shared by every step that produces a result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSpec {
  pub result_selector: Option<Template>,
  pub result_path: ResultPath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskStep {
  pub task: String,
  /// Per-invocation budget. `None` means the engine default.
  pub timeout: Option<Duration>,
  pub parameters: Option<Template>,
  pub result: ResultSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupStep {
  pub table: String,
  pub key_attribute: String,
  pub key: ValueSource,
  pub result: ResultSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecretStep {
  pub secret_id: ValueSource,
  pub result: ResultSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaitStep {
  pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
  Path(Path),
  Value(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceRule {
  pub variable: Path,
  pub comparison: Comparison,
  pub operand: Operand,
  pub next: StepId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceStep {
  /// Evaluated in order; the first match wins.
  pub rules: Vec<ChoiceRule>,
  pub default: StepId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
  Task(TaskStep),
  Lookup(LookupStep),
  Secret(SecretStep),
  Wait(WaitStep),
  Choice(ChoiceStep),
}

impl StepKind {
  pub fn type_name(&self) -> &'static str {
    match self {
      StepKind::Task(_) => "task",
      StepKind::Lookup(_) => "lookup",
      StepKind::Secret(_) => "secret",
      StepKind::Wait(_) => "wait",
      StepKind::Choice(_) => "choice",
    }
  }
}

/// A validated step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
  pub name: String,
  pub input_path: Selector,
  pub output_path: Selector,
  pub kind: StepKind,
  /// Successor for non-choice steps; `None` ends the execution.
  pub next: Option<StepId>,
}

impl Step {
  /// Every step this one can hand over to, in declaration order.
  pub fn successors(&self) -> Vec<StepId> {
    match &self.kind {
      StepKind::Choice(choice) => {
        let mut out: Vec<StepId> = choice.rules.iter().map(|r| r.next).collect();
        out.push(choice.default);
        out
      }
      _ => self.next.into_iter().collect(),
    }
  }

  pub fn is_terminal(&self) -> bool {
    self.successors().is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_selector_apply() {
    let doc = json!({ "workflow-settings": { "api-key-id": "k" }, "n": 1 });

    let root = Selector::Path(Path::root());
    assert_eq!(root.apply(&doc).unwrap(), doc);

    let settings = Selector::Path(Path::parse("$.workflow-settings").unwrap());
    assert_eq!(settings.apply(&doc).unwrap(), json!({ "api-key-id": "k" }));

    assert_eq!(Selector::Discard.apply(&doc).unwrap(), json!({}));
  }

  #[test]
  fn test_result_path_merge() {
    let input = json!({ "n": 1, "workflow-settings": { "old": true } });

    let at = ResultPath::Path(Path::parse("$.workflow-settings").unwrap());
    assert_eq!(
      at.merge(input.clone(), json!({ "new": true })).unwrap(),
      json!({ "n": 1, "workflow-settings": { "new": true } })
    );

    let root = ResultPath::Path(Path::root());
    assert_eq!(root.merge(input.clone(), json!(5)).unwrap(), json!(5));

    assert_eq!(ResultPath::Discard.merge(input.clone(), json!(5)).unwrap(), input);
  }

  #[test]
  fn test_value_source() {
    let input = json!({ "api-key-id": "jurassic-1-key" });
    let literal = ValueSource::Literal("fixed".to_string());
    let path = ValueSource::Path(Path::parse("$.api-key-id").unwrap());

    assert_eq!(literal.resolve(&input).unwrap(), json!("fixed"));
    assert_eq!(path.resolve(&input).unwrap(), json!("jurassic-1-key"));
  }
}
