//! Execution deadlines and task budgets.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{Harness, preset_workflow, scenario};
use pinwheel_config::{StateMachineDef, preset};
use pinwheel_engine::{ErrorKind, ExecutionEvent, TerminalResult, TerminalState};
use pinwheel_task_runtime::{TaskRegistry, task_fn};
use pinwheel_workflow::Workflow;
use serde_json::{Value, json};

/// Waits a second and checks `$.done`, forever unless something sets it.
fn polling_workflow(timeout_seconds: Option<u64>) -> Workflow {
  let def: StateMachineDef = serde_json::from_value(json!({
    "name": "poll-until-done",
    "start_at": "Wait 1 Second",
    "timeout_seconds": timeout_seconds,
    "steps": [
      { "name": "Wait 1 Second", "type": "wait", "seconds": 1, "next": "Job Complete?" },
      {
        "name": "Job Complete?",
        "type": "choice",
        "choices": [
          { "variable": "$.done", "comparison": "equals", "operand": { "value": 1.0 }, "next": "Done" }
        ],
        "default": "Wait 1 Second"
      },
      { "name": "Done", "type": "wait", "seconds": 0 }
    ]
  }))
  .unwrap();
  Workflow::lock(&def).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_wait_loop_times_out_after_five_minutes() {
  let harness = Harness::empty();
  let (engine, mut events) = harness.engine(TaskRegistry::new());
  let workflow = polling_workflow(Some(300));

  let result = engine.execute(&workflow, json!({ "done": 0 })).await;

  assert_eq!(result.state(), TerminalState::TimedOut);
  assert_eq!(result.result.error_kind(), Some(ErrorKind::WorkflowTimeout));
  match &result.result {
    TerminalResult::TimedOut { step, timeout } => {
      assert_eq!(*timeout, Duration::from_secs(300));
      assert!(step.is_some());
    }
    other => panic!("expected timeout, got {:?}", other),
  }
  assert!(result.elapsed >= Duration::from_secs(300));
  assert!(result.elapsed < Duration::from_secs(301));
  // Roughly one wait and one choice per second
  assert!(result.visited.len() >= 598);
  assert!(!result.visited_step("Done"));

  let events = common::drain(&mut events);
  assert!(matches!(
    events.last(),
    Some(ExecutionEvent::WorkflowTimedOut { .. })
  ));
}

#[tokio::test(start_paused = true)]
async fn test_loop_exits_when_condition_holds() {
  let harness = Harness::empty();
  let (engine, _events) = harness.engine(TaskRegistry::new());

  let result = engine
    .execute(&polling_workflow(Some(300)), json!({ "done": 1 }))
    .await;

  assert_eq!(result.state(), TerminalState::Succeeded);
  assert_eq!(result.visited, vec!["Wait 1 Second", "Job Complete?", "Done"]);
  assert_eq!(result.output(), Some(&json!({ "done": 1 })));
}

#[tokio::test(start_paused = true)]
async fn test_default_timeout_applies_without_definition_timeout() {
  let mut harness = Harness::empty();
  harness.config.default_timeout = Duration::from_secs(10);
  let (engine, _events) = harness.engine(TaskRegistry::new());

  let result = engine
    .execute(&polling_workflow(None), json!({ "done": 0 }))
    .await;

  assert_eq!(result.state(), TerminalState::TimedOut);
  assert!(result.elapsed >= Duration::from_secs(10));
  assert!(result.elapsed < Duration::from_secs(11));
}

#[tokio::test(start_paused = true)]
async fn test_explicit_timeout_overrides_definition() {
  let harness = Harness::empty();
  let (engine, _events) = harness.engine(TaskRegistry::new());

  let result = engine
    .execute_with_timeout(
      &polling_workflow(Some(300)),
      json!({ "done": 0 }),
      Duration::from_millis(2500),
    )
    .await;

  match result.result {
    TerminalResult::TimedOut { step, timeout } => {
      assert_eq!(timeout, Duration::from_millis(2500));
      assert_eq!(step.as_deref(), Some("Wait 1 Second"));
    }
    other => panic!("expected timeout, got {:?}", other),
  }
}

#[tokio::test(start_paused = true)]
async fn test_workflow_timeout_wins_over_task_budget() {
  let harness = Harness::seeded();
  let tasks = harness.tasks().with(
    preset::GENERATE_TASK,
    harness.sleeping(preset::GENERATE_TASK, Duration::from_secs(10)),
  );
  let (engine, _events) = harness.engine(tasks);

  // The execution deadline passes before the three second task budget
  let result = engine
    .execute_with_timeout(
      &preset_workflow(),
      scenario(json!(7), json!(5)),
      Duration::from_secs(2),
    )
    .await;

  assert_eq!(result.state(), TerminalState::TimedOut);
  match result.result {
    TerminalResult::TimedOut { step, .. } => {
      assert_eq!(step.as_deref(), Some(preset::GENERATE_STEP));
    }
    other => panic!("expected timeout, got {:?}", other),
  }
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_call_is_not_cancelled() {
  let harness = Harness::seeded();
  let finished = Arc::new(AtomicUsize::new(0));
  let counter = finished.clone();
  let tasks = harness.tasks().with(
    preset::GENERATE_TASK,
    task_fn(move |input: Value| {
      let counter = counter.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(input)
      }
    }),
  );
  let (engine, _events) = harness.engine(tasks);

  let result = engine
    .execute_with_timeout(
      &preset_workflow(),
      scenario(json!(7), json!(5)),
      Duration::from_secs(1),
    )
    .await;
  assert_eq!(result.state(), TerminalState::TimedOut);
  assert_eq!(finished.load(Ordering::SeqCst), 0);

  tokio::time::sleep(Duration::from_secs(5)).await;
  assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_task_step_budget_from_definition() {
  let harness = Harness::seeded();
  let def: StateMachineDef = serde_json::from_value(json!({
    "name": "budgeted",
    "start_at": "slow",
    "steps": [
      { "name": "slow", "type": "task", "task": "Slow", "timeout_seconds": 20 }
    ]
  }))
  .unwrap();
  let workflow = Workflow::lock(&def).unwrap();
  let tasks = TaskRegistry::new().with("Slow", harness.sleeping("Slow", Duration::from_secs(10)));
  let (engine, _events) = harness.engine(tasks);

  // Ten seconds exceeds the three second default but not the step's own budget
  let result = engine.execute(&workflow, json!({ "x": 1 })).await;

  assert_eq!(result.state(), TerminalState::Succeeded);
  assert_eq!(result.output(), Some(&json!({ "x": 1 })));
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_timeout_runs_to_completion() {
  let harness = Harness::empty();
  let def: StateMachineDef = serde_json::from_value(json!({
    "name": "never-expires",
    "start_at": "pause",
    "timeout_seconds": u64::MAX,
    "steps": [
      { "name": "pause", "type": "wait", "seconds": 1 }
    ]
  }))
  .unwrap();
  let workflow = Workflow::lock(&def).unwrap();
  assert_eq!(workflow.timeout(), Some(Duration::from_secs(u64::MAX)));
  let (engine, _events) = harness.engine(TaskRegistry::new());

  let result = engine.execute(&workflow, json!({ "x": 1 })).await;
  assert_eq!(result.state(), TerminalState::Succeeded);
  assert_eq!(result.output(), Some(&json!({ "x": 1 })));

  let result = engine
    .execute_with_timeout(&workflow, json!({ "x": 2 }), Duration::MAX)
    .await;
  assert_eq!(result.state(), TerminalState::Succeeded);
}
