//! Pinwheel Config
//!
//! This crate contains the serializable state machine definition types for
//! pinwheel. These types describe a workflow before it is validated and
//! locked by `pinwheel-workflow`.
//!
//! Definitions can be loaded from:
//! - JSON files (via the CLI with `pinwheel run --definition machine.json`)
//! - Code, using the builders in [`preset`]
//!
//! Paths are kept as raw strings here. They are parsed and checked when the
//! definition is locked.

mod choice;
pub mod preset;
mod source;
mod state_machine;
mod step;

pub use choice::{ChoiceRuleDef, Comparison, OperandDef};
pub use source::{PathDef, ValueSourceDef};
pub use state_machine::StateMachineDef;
pub use step::{StepDef, StepKindDef};
