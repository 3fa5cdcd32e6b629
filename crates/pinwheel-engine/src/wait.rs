//! Timed waits.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Suspends an execution for a duration.
///
/// Implementations must yield to the scheduler while waiting so that other
/// executions keep running.
pub trait Waiter: Send + Sync {
  fn wait(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Waits on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioWaiter;

impl Waiter for TokioWaiter {
  fn wait(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
    Box::pin(tokio::time::sleep(duration))
  }
}
