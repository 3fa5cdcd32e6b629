//! Pinwheel Workflow
//!
//! This crate provides the "locked" state machine representation for
//! pinwheel. A locked workflow is a validated, resolved form of a
//! [`pinwheel_config::StateMachineDef`] that is ready for execution.
//!
//! Key differences from `pinwheel-config`:
//! - Steps live in an arena and reference successors by [`StepId`]
//! - Every successor exists and every step is reachable from the entry
//! - Paths and templates are parsed once, up front
//! - Durations are converted and checked

mod error;
mod graph;
pub mod path;
mod step;
pub mod template;
mod workflow;

pub use error::WorkflowError;
pub use graph::Graph;
pub use path::{Path, PathError};
pub use pinwheel_config::Comparison;
pub use step::{
  ChoiceRule, ChoiceStep, LookupStep, Operand, ResultPath, ResultSpec, SecretStep, Selector, Step,
  StepId, StepKind, TaskStep, ValueSource, WaitStep,
};
pub use template::Template;
pub use workflow::Workflow;
