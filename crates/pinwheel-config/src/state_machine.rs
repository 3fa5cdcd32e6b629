use serde::{Deserialize, Serialize};

use crate::step::StepDef;

/// A complete state machine definition, as written by users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachineDef {
  pub name: String,
  /// Name of the entry step.
  pub start_at: String,
  /// Wall-clock budget for one whole execution.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_seconds: Option<u64>,
  pub steps: Vec<StepDef>,
}

impl StateMachineDef {
  /// Find a step definition by name.
  pub fn step(&self, name: &str) -> Option<&StepDef> {
    self.steps.iter().find(|s| s.name == name)
  }
}
