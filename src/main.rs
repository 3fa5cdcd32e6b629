mod demo;
mod fixtures;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pinwheel_config::{StateMachineDef, preset};
use pinwheel_engine::{Capabilities, EngineConfig, TerminalResult, WorkflowEngine};
use pinwheel_workflow::Workflow;

use crate::fixtures::Fixtures;

/// Pinwheel - a small state machine runner for task, lookup, secret, wait
/// and choice steps
#[derive(Parser)]
#[command(name = "pinwheel")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a state machine once, reading the initial payload from stdin
  Run {
    /// Path to a state machine definition (JSON). Defaults to the built-in
    /// random number state machine
    #[arg(long, env = "PINWHEEL_DEFINITION")]
    definition: Option<PathBuf>,

    /// Path to a fixtures file seeding the in-memory tables and secrets
    #[arg(long, env = "PINWHEEL_FIXTURES")]
    fixtures: Option<PathBuf>,

    /// Execution timeout, overriding the definition's own
    #[arg(long, env = "PINWHEEL_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Task budget for steps that do not set one
    #[arg(long, env = "PINWHEEL_TASK_TIMEOUT_SECS", default_value_t = preset::TASK_TIMEOUT_SECONDS)]
    task_timeout_secs: u64,
  },

  /// Check a state machine definition without running it
  Validate {
    /// Path to the definition file (JSON)
    definition: PathBuf,
  },

  /// Print the built-in random number state machine as JSON
  PrintPreset {
    /// Deployment stage used in the table name
    #[arg(long, default_value = preset::DEFAULT_STAGE)]
    stage: String,

    /// Key of the workflow settings record to look up
    #[arg(long, default_value = preset::DEFAULT_WORKFLOW_KEY)]
    workflow_key: String,
  },
}

fn main() -> Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Run {
      definition,
      fixtures,
      timeout_secs,
      task_timeout_secs,
    }) => {
      let config = EngineConfig {
        default_task_timeout: Duration::from_secs(task_timeout_secs),
        ..EngineConfig::default()
      };
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_workflow(
        definition,
        fixtures,
        timeout_secs.map(Duration::from_secs),
        config,
      ))
    }
    Some(Commands::Validate { definition }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(validate(&definition))?;
      Ok(ExitCode::SUCCESS)
    }
    Some(Commands::PrintPreset {
      stage,
      workflow_key,
    }) => {
      let def = preset::random_number_state_machine_for(&stage, &workflow_key);
      println!("{}", serde_json::to_string_pretty(&def)?);
      Ok(ExitCode::SUCCESS)
    }
    None => {
      println!("pinwheel - use --help to see available commands");
      Ok(ExitCode::SUCCESS)
    }
  }
}

async fn run_workflow(
  definition: Option<PathBuf>,
  fixtures: Option<PathBuf>,
  timeout: Option<Duration>,
  config: EngineConfig,
) -> Result<ExitCode> {
  let def = match &definition {
    Some(path) => load_definition(path).await?,
    None => preset::random_number_state_machine(),
  };
  let workflow = Workflow::lock(&def).context("invalid state machine definition")?;

  let fixtures = match &fixtures {
    Some(path) => Fixtures::load(path).await?,
    None => Fixtures::default(),
  };
  let capabilities = Capabilities::new(
    demo::registry(),
    Arc::new(fixtures.kv_store()?),
    Arc::new(fixtures.secret_store()),
  );

  let engine = WorkflowEngine::new(config, capabilities);
  engine.check(&workflow)?;

  let payload = read_payload_from_stdin()?;
  info!(workflow = %workflow.name(), steps = workflow.steps().len(), "loaded state machine");

  let result = match timeout {
    Some(timeout) => engine.execute_with_timeout(&workflow, payload, timeout).await,
    None => engine.execute(&workflow, payload).await,
  };

  println!("{}", serde_json::to_string_pretty(&result)?);

  Ok(match result.result {
    TerminalResult::Succeeded { .. } => ExitCode::SUCCESS,
    TerminalResult::Failed { .. } => ExitCode::FAILURE,
    TerminalResult::TimedOut { .. } => ExitCode::from(2),
  })
}

async fn validate(path: &Path) -> Result<()> {
  let def = load_definition(path).await?;
  let workflow = Workflow::lock(&def)
    .with_context(|| format!("invalid state machine definition: {}", path.display()))?;

  println!("{}", describe(&workflow));
  Ok(())
}

/// One-line summary of a locked workflow.
fn describe(workflow: &Workflow) -> String {
  let ends: Vec<&str> = workflow
    .graph()
    .terminal_steps()
    .into_iter()
    .map(|id| workflow.step(id).name.as_str())
    .collect();

  format!(
    "{}: {} steps, entry '{}', ends [{}], tasks [{}]",
    workflow.name(),
    workflow.steps().len(),
    workflow.step(workflow.entry()).name,
    ends.join(", "),
    workflow.task_names().join(", ")
  )
}

async fn load_definition(path: &Path) -> Result<StateMachineDef> {
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read definition file: {}", path.display()))?;

  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse definition file: {}", path.display()))
}

fn read_payload_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, use empty object
    Ok(serde_json::json!({}))
  } else {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read payload from stdin")?;

    if input.trim().is_empty() {
      Ok(serde_json::json!({}))
    } else {
      serde_json::from_str(&input).context("failed to parse payload JSON from stdin")
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[tokio::test]
  async fn test_validate_accepts_preset() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let preset = serde_json::to_string(&preset::random_number_state_machine()).unwrap();
    file.write_all(preset.as_bytes()).unwrap();

    validate(file.path()).await.unwrap();
  }

  #[test]
  fn test_describe_lists_terminal_steps() {
    let workflow = Workflow::lock(&preset::random_number_state_machine()).unwrap();
    let summary = describe(&workflow);

    assert!(summary.starts_with("randomNumberStateMachine: "));
    assert!(summary.contains(&format!("entry '{}'", preset::GENERATE_STEP)));
    assert!(summary.contains(&format!(
      "ends [{}, {}]",
      preset::GREATER_STEP,
      preset::LESSER_STEP
    )));
  }

  #[tokio::test]
  async fn test_validate_reports_unknown_successor() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      r#"{{ "name": "broken", "start_at": "a", "steps": [{{ "name": "a", "type": "wait", "seconds": 1, "next": "b" }}] }}"#
    )
    .unwrap();

    let err = validate(file.path()).await.unwrap_err();
    assert!(format!("{:#}", err).contains("invalid state machine definition"));
  }

  #[test]
  fn test_cli_parses_run_flags() {
    let cli = Cli::try_parse_from(["pinwheel", "run", "--timeout-secs", "30"]).unwrap();
    match cli.command {
      Some(Commands::Run {
        timeout_secs,
        task_timeout_secs,
        ..
      }) => {
        assert_eq!(timeout_secs, Some(30));
        assert_eq!(task_timeout_secs, 3);
      }
      _ => panic!("expected run command"),
    }
  }
}
