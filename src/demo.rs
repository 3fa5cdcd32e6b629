//! Built-in tasks for the random number state machine.

use pinwheel_config::preset;
use pinwheel_task_runtime::{TaskError, TaskRegistry, task_fn};
use rand::Rng;
use serde_json::{Map, Value, json};

const DEFAULT_MAX_NUMBER: u64 = 10;
const DEFAULT_NUMBER_TO_CHECK: u64 = 5;

/// Registry with the three demo tasks.
pub fn registry() -> TaskRegistry {
  TaskRegistry::new()
    .with(
      preset::GENERATE_TASK,
      task_fn(|input: Value| async move { generate(input) }),
    )
    .with(
      preset::GREATER_TASK,
      task_fn(|input: Value| async move { verdict(input, "greater than") }),
    )
    .with(
      preset::LESSER_TASK,
      task_fn(|input: Value| async move { verdict(input, "less than or equal to") }),
    )
}

/// Draw a number in `1..=maxNumber` and pass `numberToCheck` along.
fn generate(input: Value) -> Result<Value, TaskError> {
  let mut fields = into_object(input)?;

  let max = match fields.get("maxNumber") {
    None => DEFAULT_MAX_NUMBER,
    Some(value) => value
      .as_u64()
      .filter(|max| *max > 0)
      .ok_or_else(|| TaskError::invalid_input("maxNumber must be a positive integer"))?,
  };
  let threshold = match fields.get(preset::THRESHOLD_FIELD) {
    None => json!(DEFAULT_NUMBER_TO_CHECK),
    Some(value) => value.clone(),
  };

  let generated = rand::thread_rng().gen_range(1..=max);
  fields.insert(preset::GENERATED_FIELD.to_string(), json!(generated));
  fields.insert(preset::THRESHOLD_FIELD.to_string(), threshold);
  Ok(Value::Object(fields))
}

fn verdict(input: Value, relation: &str) -> Result<Value, TaskError> {
  let mut fields = into_object(input)?;
  let message = format!(
    "{} is {} {}",
    fields.get(preset::GENERATED_FIELD).cloned().unwrap_or(Value::Null),
    relation,
    fields.get(preset::THRESHOLD_FIELD).cloned().unwrap_or(Value::Null),
  );
  fields.insert("message".to_string(), json!(message));
  Ok(Value::Object(fields))
}

fn into_object(input: Value) -> Result<Map<String, Value>, TaskError> {
  match input {
    Value::Object(fields) => Ok(fields),
    Value::Null => Ok(Map::new()),
    _ => Err(TaskError::invalid_input("task input must be a JSON object")),
  }
}
