use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
  #[error("table not found: {table}")]
  TableNotFound { table: String },

  #[error("table '{table}' is keyed by '{expected}', not '{actual}'")]
  KeyAttributeMismatch {
    table: String,
    expected: String,
    actual: String,
  },

  #[error("item for table '{table}' has no string attribute '{key_attribute}'")]
  MissingKey { table: String, key_attribute: String },

  #[error("key-value backend error: {message}")]
  Backend { message: String },
}

impl KvError {
  pub fn backend(message: impl Into<String>) -> Self {
    Self::Backend {
      message: message.into(),
    }
  }
}
