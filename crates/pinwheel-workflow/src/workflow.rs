use std::collections::HashMap;
use std::time::Duration;

use pinwheel_config::{ChoiceRuleDef, OperandDef, PathDef, StateMachineDef, StepDef, StepKindDef, ValueSourceDef};
use serde_json::Value;

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::path::Path;
use crate::step::{
  ChoiceRule, ChoiceStep, LookupStep, Operand, ResultPath, ResultSpec, SecretStep, Selector, Step,
  StepId, StepKind, TaskStep, ValueSource, WaitStep,
};
use crate::template::Template;

/// A locked state machine ready for execution.
///
/// Steps live in an arena and refer to each other by [`StepId`]. A locked
/// workflow is immutable and can be shared between concurrent executions.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
  name: String,
  steps: Vec<Step>,
  entry: StepId,
  timeout: Option<Duration>,
  index: HashMap<String, StepId>,
}

impl Workflow {
  /// Validate a definition and resolve every step reference.
  pub fn lock(def: &StateMachineDef) -> Result<Self, WorkflowError> {
    if def.steps.is_empty() {
      return Err(WorkflowError::Empty(def.name.clone()));
    }

    let mut index = HashMap::with_capacity(def.steps.len());
    for (i, step) in def.steps.iter().enumerate() {
      if step.name.is_empty() {
        return Err(WorkflowError::EmptyStepName);
      }
      if index.insert(step.name.clone(), StepId(i)).is_some() {
        return Err(WorkflowError::DuplicateStep(step.name.clone()));
      }
    }

    let entry = *index
      .get(&def.start_at)
      .ok_or_else(|| WorkflowError::UnknownEntry(def.start_at.clone()))?;

    let timeout = match def.timeout_seconds {
      Some(0) => {
        return Err(WorkflowError::InvalidDuration {
          owner: format!("state machine '{}'", def.name),
          message: "timeout must be positive".to_string(),
        });
      }
      Some(seconds) => Some(Duration::from_secs(seconds)),
      None => None,
    };

    let locker = Locker { index: &index };
    let steps = def
      .steps
      .iter()
      .map(|step| locker.lock_step(step))
      .collect::<Result<Vec<_>, _>>()?;

    let unreachable = Graph::new(&steps).unreachable_from(entry);
    if !unreachable.is_empty() {
      return Err(WorkflowError::Unreachable {
        steps: unreachable
          .into_iter()
          .map(|id| steps[id.0].name.clone())
          .collect(),
      });
    }

    Ok(Self {
      name: def.name.clone(),
      steps,
      entry,
      timeout,
      index,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn entry(&self) -> StepId {
    self.entry
  }

  /// Whole-execution budget declared by the definition.
  pub fn timeout(&self) -> Option<Duration> {
    self.timeout
  }

  pub fn steps(&self) -> &[Step] {
    &self.steps
  }

  /// Get a step by id. Ids always come from this workflow.
  pub fn step(&self, id: StepId) -> &Step {
    &self.steps[id.0]
  }

  pub fn step_id(&self, name: &str) -> Option<StepId> {
    self.index.get(name).copied()
  }

  /// Get a step by name.
  pub fn get_step(&self, name: &str) -> Option<&Step> {
    self.step_id(name).map(|id| self.step(id))
  }

  /// Build the graph structure for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.steps)
  }

  /// Names of all tasks referenced by task steps.
  pub fn task_names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self
      .steps
      .iter()
      .filter_map(|step| match &step.kind {
        StepKind::Task(task) => Some(task.task.as_str()),
        _ => None,
      })
      .collect();
    names.sort_unstable();
    names.dedup();
    names
  }
}

/// Converts step definitions once all names are known.
struct Locker<'a> {
  index: &'a HashMap<String, StepId>,
}

impl Locker<'_> {
  fn lock_step(&self, def: &StepDef) -> Result<Step, WorkflowError> {
    let name = def.name.as_str();
    let input_path = self.selector(name, "input_path", &def.input_path)?;
    let output_path = self.selector(name, "output_path", &def.output_path)?;

    let (kind, next) = match &def.kind {
      StepKindDef::Task {
        task,
        timeout_seconds,
        parameters,
        result_selector,
        result_path,
        next,
      } => {
        let timeout = match timeout_seconds {
          Some(0) => {
            return Err(WorkflowError::InvalidDuration {
              owner: format!("step '{}'", name),
              message: "task timeout must be positive".to_string(),
            });
          }
          Some(seconds) => Some(Duration::from_secs(*seconds)),
          None => None,
        };
        let step = TaskStep {
          task: task.clone(),
          timeout,
          parameters: self.template(name, "parameters", parameters.as_ref())?,
          result: self.result_spec(name, result_selector.as_ref(), result_path)?,
        };
        (StepKind::Task(step), self.successor(name, next.as_deref())?)
      }
      StepKindDef::Lookup {
        table,
        key_attribute,
        key,
        result_selector,
        result_path,
        next,
      } => {
        let step = LookupStep {
          table: table.clone(),
          key_attribute: key_attribute.clone(),
          key: self.value_source(name, "key", key)?,
          result: self.result_spec(name, result_selector.as_ref(), result_path)?,
        };
        (StepKind::Lookup(step), self.successor(name, next.as_deref())?)
      }
      StepKindDef::Secret {
        secret_id,
        result_selector,
        result_path,
        next,
      } => {
        let step = SecretStep {
          secret_id: self.value_source(name, "secret_id", secret_id)?,
          result: self.result_spec(name, result_selector.as_ref(), result_path)?,
        };
        (StepKind::Secret(step), self.successor(name, next.as_deref())?)
      }
      StepKindDef::Wait { seconds, next } => {
        let step = WaitStep {
          duration: Duration::from_secs(*seconds),
        };
        (StepKind::Wait(step), self.successor(name, next.as_deref())?)
      }
      StepKindDef::Choice { choices, default } => {
        if choices.is_empty() {
          return Err(WorkflowError::EmptyChoice(name.to_string()));
        }
        let rules = choices
          .iter()
          .map(|rule| self.choice_rule(name, rule))
          .collect::<Result<Vec<_>, _>>()?;
        let step = ChoiceStep {
          rules,
          default: self.resolve(name, default)?,
        };
        (StepKind::Choice(step), None)
      }
    };

    Ok(Step {
      name: name.to_string(),
      input_path,
      output_path,
      kind,
      next,
    })
  }

  fn resolve(&self, step: &str, target: &str) -> Result<StepId, WorkflowError> {
    self
      .index
      .get(target)
      .copied()
      .ok_or_else(|| WorkflowError::UnknownSuccessor {
        step: step.to_string(),
        target: target.to_string(),
      })
  }

  fn successor(&self, step: &str, next: Option<&str>) -> Result<Option<StepId>, WorkflowError> {
    next.map(|target| self.resolve(step, target)).transpose()
  }

  fn path(&self, step: &str, field: &'static str, raw: &str) -> Result<Path, WorkflowError> {
    Path::parse(raw).map_err(|source| WorkflowError::InvalidPath {
      step: step.to_string(),
      field,
      source,
    })
  }

  fn selector(
    &self,
    step: &str,
    field: &'static str,
    def: &PathDef,
  ) -> Result<Selector, WorkflowError> {
    match &def.0 {
      Some(raw) => Ok(Selector::Path(self.path(step, field, raw)?)),
      None => Ok(Selector::Discard),
    }
  }

  fn template(
    &self,
    step: &str,
    field: &'static str,
    value: Option<&Value>,
  ) -> Result<Option<Template>, WorkflowError> {
    value
      .map(|v| {
        Template::parse(v).map_err(|source| WorkflowError::InvalidPath {
          step: step.to_string(),
          field,
          source,
        })
      })
      .transpose()
  }

  fn result_spec(
    &self,
    step: &str,
    result_selector: Option<&Value>,
    result_path: &PathDef,
  ) -> Result<ResultSpec, WorkflowError> {
    let result_path = match &result_path.0 {
      Some(raw) => ResultPath::Path(self.path(step, "result_path", raw)?),
      None => ResultPath::Discard,
    };
    Ok(ResultSpec {
      result_selector: self.template(step, "result_selector", result_selector)?,
      result_path,
    })
  }

  fn value_source(
    &self,
    step: &str,
    field: &'static str,
    def: &ValueSourceDef,
  ) -> Result<ValueSource, WorkflowError> {
    match def {
      ValueSourceDef::Value(value) => Ok(ValueSource::Literal(value.clone())),
      ValueSourceDef::Path(raw) => Ok(ValueSource::Path(self.path(step, field, raw)?)),
    }
  }

  fn choice_rule(&self, step: &str, def: &ChoiceRuleDef) -> Result<ChoiceRule, WorkflowError> {
    let operand = match &def.operand {
      OperandDef::Path(raw) => Operand::Path(self.path(step, "choice operand", raw)?),
      OperandDef::Value(value) => Operand::Value(*value),
    };
    Ok(ChoiceRule {
      variable: self.path(step, "choice variable", &def.variable)?,
      comparison: def.comparison,
      operand,
      next: self.resolve(step, &def.next)?,
    })
  }
}
