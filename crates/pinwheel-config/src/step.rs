use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::choice::ChoiceRuleDef;
use crate::source::{PathDef, ValueSourceDef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDef {
  /// Unique step name within the state machine.
  pub name: String,
  #[serde(flatten)]
  pub kind: StepKindDef,
  /// Which part of the context the step reads.
  #[serde(default, skip_serializing_if = "PathDef::is_root")]
  pub input_path: PathDef,
  /// Which part of the step output is passed on.
  #[serde(default, skip_serializing_if = "PathDef::is_root")]
  pub output_path: PathDef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKindDef {
  /// Invoke an external task by name.
  Task {
    task: String,
    /// Execution budget for one invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_seconds: Option<u64>,
    /// Payload template; `"key.$"` entries are resolved as paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result_selector: Option<Value>,
    #[serde(default, skip_serializing_if = "PathDef::is_root")]
    result_path: PathDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next: Option<String>,
  },
  /// Fetch one item from a key-value table.
  Lookup {
    table: String,
    key_attribute: String,
    key: ValueSourceDef,
    /// Projection applied to `{ "Item": <item> }`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result_selector: Option<Value>,
    #[serde(default, skip_serializing_if = "PathDef::is_root")]
    result_path: PathDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next: Option<String>,
  },
  /// Resolve a secret value by id.
  Secret {
    secret_id: ValueSourceDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result_selector: Option<Value>,
    #[serde(default, skip_serializing_if = "PathDef::is_root")]
    result_path: PathDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next: Option<String>,
  },
  /// Pause the execution.
  Wait {
    seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next: Option<String>,
  },
  /// Branch on numeric comparisons.
  Choice {
    choices: Vec<ChoiceRuleDef>,
    default: String,
  },
}

impl StepKindDef {
  /// Short type name, matching the serialized tag.
  pub fn type_name(&self) -> &'static str {
    match self {
      StepKindDef::Task { .. } => "task",
      StepKindDef::Lookup { .. } => "lookup",
      StepKindDef::Secret { .. } => "secret",
      StepKindDef::Wait { .. } => "wait",
      StepKindDef::Choice { .. } => "choice",
    }
  }
}
