//! Pinwheel Workflow Engine
//!
//! This crate executes locked workflows from `pinwheel-workflow` against
//! external collaborators: tasks from `pinwheel-task-runtime`, key-value
//! tables from `pinwheel-host-kv` and secrets from `pinwheel-host-secrets`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WorkflowRunner                         │
//! │  - owns mpsc channel (sender + receiver)                    │
//! │  - run(payload) triggers execution                          │
//! │  - start(cancel) runs executions until cancelled            │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     WorkflowEngine                          │
//! │  - execute(workflow, payload) → ExecutionResult             │
//! │  - one step at a time, global deadline                      │
//! │  - input/result/output path processing                      │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Capabilities                           │
//! │  TaskRegistry · KvStore · SecretStore · Waiter              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use pinwheel_engine::{Capabilities, EngineConfig, WorkflowEngine};
//!
//! let capabilities = Capabilities::new(tasks, Arc::new(kv), Arc::new(secrets));
//! let engine = WorkflowEngine::new(EngineConfig::default(), capabilities);
//! engine.check(&workflow)?;
//!
//! let result = engine.execute(&workflow, serde_json::json!({})).await;
//! ```

mod choice;
mod config;
mod context;
mod engine;
mod error;
mod events;
mod millis;
mod result;
mod runner;
mod wait;

pub use choice::ChoiceRouter;
pub use config::{DEFAULT_TASK_TIMEOUT, DEFAULT_TIMEOUT, EngineConfig};
pub use context::{ExecutionContext, select_result};
pub use engine::{Capabilities, WorkflowEngine};
pub use error::{EngineError, ErrorKind, StepError, StepFailure};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use result::{ExecutionResult, TerminalResult, TerminalState};
pub use runner::{RunnerStats, WorkflowRunner};
pub use wait::{TokioWaiter, Waiter};
