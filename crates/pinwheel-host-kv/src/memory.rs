use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{PoisonError, RwLock};

use crate::error::KvError;
use crate::record::WorkflowRecord;
use crate::{Item, KvStore};

#[derive(Debug)]
struct Table {
  key_attribute: String,
  items: HashMap<String, Item>,
}

/// In-memory key-value store.
///
/// Suitable for tests and local runs. Tables must be created before items
/// are put into them.
#[derive(Debug, Default)]
pub struct InMemoryKvStore {
  tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryKvStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a table keyed by `key_attribute`. An existing table is kept.
  pub fn create_table(&self, table: &str, key_attribute: &str) {
    let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
    tables.entry(table.to_string()).or_insert_with(|| Table {
      key_attribute: key_attribute.to_string(),
      items: HashMap::new(),
    });
  }

  /// Insert or replace an item. The item must carry the table's key attribute
  /// as a string.
  pub fn put_item(&self, table: &str, item: Item) -> Result<(), KvError> {
    let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
    let entry = tables.get_mut(table).ok_or_else(|| KvError::TableNotFound {
      table: table.to_string(),
    })?;

    let key = item
      .get(&entry.key_attribute)
      .and_then(|v| v.as_str())
      .ok_or_else(|| KvError::MissingKey {
        table: table.to_string(),
        key_attribute: entry.key_attribute.clone(),
      })?
      .to_string();

    entry.items.insert(key, item);
    Ok(())
  }

  /// Store a workflow record under `key`.
  pub fn put_record(&self, table: &str, key: &str, record: &WorkflowRecord) -> Result<(), KvError> {
    let key_attribute = {
      let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
      tables
        .get(table)
        .map(|t| t.key_attribute.clone())
        .ok_or_else(|| KvError::TableNotFound {
          table: table.to_string(),
        })?
    };
    self.put_item(table, record.to_item(&key_attribute, key))
  }

  fn lookup(&self, table: &str, key_attribute: &str, key: &str) -> Result<Option<Item>, KvError> {
    let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
    let entry = tables.get(table).ok_or_else(|| KvError::TableNotFound {
      table: table.to_string(),
    })?;

    if entry.key_attribute != key_attribute {
      return Err(KvError::KeyAttributeMismatch {
        table: table.to_string(),
        expected: entry.key_attribute.clone(),
        actual: key_attribute.to_string(),
      });
    }

    Ok(entry.items.get(key).cloned())
  }
}

impl KvStore for InMemoryKvStore {
  fn get_item(
    &self,
    table: &str,
    key_attribute: &str,
    key: &str,
  ) -> Pin<Box<dyn Future<Output = Result<Option<Item>, KvError>> + Send + '_>> {
    let result = self.lookup(table, key_attribute, key);
    Box::pin(async move { result })
  }
}
