use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{PoisonError, RwLock};

use crate::error::SecretError;
use crate::value::SecretValue;
use crate::SecretStore;

#[derive(Debug, Default)]
struct Secrets {
  values: HashMap<String, SecretValue>,
  denied: HashSet<String>,
}

/// In-memory secret store.
///
/// Ids can be marked as denied to simulate missing permissions; a denied id
/// reports `AccessDenied` whether or not a value is stored.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
  inner: RwLock<Secrets>,
}

impl InMemorySecretStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&self, secret_id: impl Into<String>, value: impl Into<SecretValue>) {
    let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
    inner.values.insert(secret_id.into(), value.into());
  }

  pub fn deny(&self, secret_id: impl Into<String>) {
    let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
    inner.denied.insert(secret_id.into());
  }

  fn lookup(&self, secret_id: &str) -> Result<SecretValue, SecretError> {
    let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
    if inner.denied.contains(secret_id) {
      return Err(SecretError::AccessDenied {
        secret_id: secret_id.to_string(),
      });
    }
    inner
      .values
      .get(secret_id)
      .cloned()
      .ok_or_else(|| SecretError::NotFound {
        secret_id: secret_id.to_string(),
      })
  }
}

impl SecretStore for InMemorySecretStore {
  fn get_secret(
    &self,
    secret_id: &str,
  ) -> Pin<Box<dyn Future<Output = Result<SecretValue, SecretError>> + Send + '_>> {
    let result = self.lookup(secret_id);
    Box::pin(async move { result })
  }
}
