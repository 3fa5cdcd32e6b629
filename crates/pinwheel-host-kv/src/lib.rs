//! Key-value lookups for pinwheel.
//!
//! Lookup steps fetch a single item from an external table by primary key.
//! The engine only reads; tables are created and filled elsewhere. This crate
//! provides the [`KvStore`] trait, an [`InMemoryKvStore`] for tests and local
//! runs, and the [`WorkflowRecord`] row shape used by prompt workflows.

mod error;
mod memory;
mod record;

use std::future::Future;
use std::pin::Pin;

pub use error::KvError;
pub use memory::InMemoryKvStore;
pub use record::WorkflowRecord;

/// A stored item: attribute name to value.
pub type Item = serde_json::Map<String, serde_json::Value>;

/// Read access to key-value tables.
///
/// This trait is async to support networked backends. Implementations must
/// not mutate the store on reads.
pub trait KvStore: Send + Sync {
  /// Fetch the item whose `key_attribute` equals `key`.
  ///
  /// Returns `Ok(None)` when the table exists but holds no such item.
  fn get_item(
    &self,
    table: &str,
    key_attribute: &str,
    key: &str,
  ) -> Pin<Box<dyn Future<Output = Result<Option<Item>, KvError>> + Send + '_>>;
}
