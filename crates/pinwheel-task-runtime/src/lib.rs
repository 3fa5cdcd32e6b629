//! Task invocation for pinwheel.
//!
//! A task is an external unit of work: JSON in, JSON out. This crate knows
//! nothing about workflows. It provides:
//! - [`TaskInvoker`], the trait task implementations satisfy
//! - [`task_fn`], an adapter for async closures
//! - [`TaskRegistry`], which maps task names to invokers and runs one
//!   invocation under a time budget

mod error;
mod invoker;
mod registry;

pub use error::{InvokeError, TaskError};
pub use invoker::{FnTask, TaskInvoker, task_fn};
pub use registry::TaskRegistry;
