//! Built-in definition of the random number state machine.
//!
//! The machine generates a number, loads the workflow settings for a prompt
//! workflow from a key-value table, resolves the API key those settings point
//! at, waits one second and then branches on the generated number:
//!
//! ```text
//! generate ─▶ lookup ─▶ secret ─▶ wait ─▶ choice ─┬─▶ greater   (n > threshold)
//!                                                 └─▶ lesser    (n <= threshold, default)
//! ```

use serde_json::json;

use crate::choice::{ChoiceRuleDef, Comparison, OperandDef};
use crate::source::{PathDef, ValueSourceDef};
use crate::state_machine::StateMachineDef;
use crate::step::{StepDef, StepKindDef};

pub const STATE_MACHINE_NAME: &str = "randomNumberStateMachine";
pub const DEFAULT_STAGE: &str = "dev001";
pub const DEFAULT_WORKFLOW_KEY: &str = "autoGenerateFullArticle";
pub const KEY_ATTRIBUTE: &str = "gpt3-workflow-id";
pub const TIMEOUT_SECONDS: u64 = 300;
pub const TASK_TIMEOUT_SECONDS: u64 = 3;
pub const WAIT_SECONDS: u64 = 1;

pub const GENERATE_TASK: &str = "GenerateRandomNumber";
pub const GREATER_TASK: &str = "NumberGreaterThan";
pub const LESSER_TASK: &str = "NumberLessThan";

pub const GENERATE_STEP: &str = "Generate random number invocation";
pub const SECRET_STEP: &str = "get-api-key-secret";
pub const WAIT_STEP: &str = "Wait 1 Second";
pub const CHOICE_STEP: &str = "Job Complete?";
pub const GREATER_STEP: &str = "Get Number is greater than invocation";
pub const LESSER_STEP: &str = "Get Number is less than or equal invocation";

/// Field the generate task writes its number to.
pub const GENERATED_FIELD: &str = "generatedRandomNumber";
/// Field holding the threshold the number is compared against.
pub const THRESHOLD_FIELD: &str = "numberToCheck";

/// Name of the workflow settings table for a stage.
pub fn table_name(stage: &str) -> String {
  format!("gpt3-workflow-{}", stage)
}

/// Name of the lookup step for a stage.
pub fn lookup_step_name(stage: &str) -> String {
  format!("Get Item from {}", table_name(stage))
}

/// The random number state machine for the default stage and workflow key.
pub fn random_number_state_machine() -> StateMachineDef {
  random_number_state_machine_for(DEFAULT_STAGE, DEFAULT_WORKFLOW_KEY)
}

/// The random number state machine for a given stage and workflow key.
pub fn random_number_state_machine_for(stage: &str, workflow_key: &str) -> StateMachineDef {
  let lookup_step = lookup_step_name(stage);
  let generated = format!("$.{}", GENERATED_FIELD);
  let threshold = format!("$.{}", THRESHOLD_FIELD);

  let steps = vec![
    task_step(GENERATE_STEP, GENERATE_TASK, Some(&lookup_step)),
    StepDef {
      name: lookup_step.clone(),
      kind: StepKindDef::Lookup {
        table: table_name(stage),
        key_attribute: KEY_ATTRIBUTE.to_string(),
        key: ValueSourceDef::Value(workflow_key.to_string()),
        result_selector: Some(json!({
          "api-endpoint.$": "$.Item.api-endpoint",
          "api-key-id.$": "$.Item.api-key-id",
          "prompt-sequence.$": "$.Item.prompt-sequence",
        })),
        result_path: PathDef::at("$.workflow-settings"),
        next: Some(SECRET_STEP.to_string()),
      },
      input_path: PathDef::root(),
      output_path: PathDef::root(),
    },
    StepDef {
      name: SECRET_STEP.to_string(),
      kind: StepKindDef::Secret {
        secret_id: ValueSourceDef::Path("$.api-key-id".to_string()),
        result_selector: None,
        result_path: PathDef::at("$.secret"),
        next: Some(WAIT_STEP.to_string()),
      },
      input_path: PathDef::at("$.workflow-settings"),
      output_path: PathDef::root(),
    },
    StepDef {
      name: WAIT_STEP.to_string(),
      kind: StepKindDef::Wait {
        seconds: WAIT_SECONDS,
        next: Some(CHOICE_STEP.to_string()),
      },
      input_path: PathDef::root(),
      output_path: PathDef::root(),
    },
    StepDef {
      name: CHOICE_STEP.to_string(),
      kind: StepKindDef::Choice {
        choices: vec![
          ChoiceRuleDef {
            variable: generated.clone(),
            comparison: Comparison::GreaterThan,
            operand: OperandDef::Path(threshold.clone()),
            next: GREATER_STEP.to_string(),
          },
          ChoiceRuleDef {
            variable: generated,
            comparison: Comparison::LessThanEquals,
            operand: OperandDef::Path(threshold),
            next: LESSER_STEP.to_string(),
          },
        ],
        default: LESSER_STEP.to_string(),
      },
      input_path: PathDef::root(),
      output_path: PathDef::root(),
    },
    task_step(GREATER_STEP, GREATER_TASK, None),
    task_step(LESSER_STEP, LESSER_TASK, None),
  ];

  StateMachineDef {
    name: STATE_MACHINE_NAME.to_string(),
    start_at: GENERATE_STEP.to_string(),
    timeout_seconds: Some(TIMEOUT_SECONDS),
    steps,
  }
}

fn task_step(name: &str, task: &str, next: Option<&str>) -> StepDef {
  StepDef {
    name: name.to_string(),
    kind: StepKindDef::Task {
      task: task.to_string(),
      timeout_seconds: Some(TASK_TIMEOUT_SECONDS),
      parameters: None,
      result_selector: None,
      result_path: PathDef::root(),
      next: next.map(str::to_string),
    },
    input_path: PathDef::root(),
    output_path: PathDef::root(),
  }
}
