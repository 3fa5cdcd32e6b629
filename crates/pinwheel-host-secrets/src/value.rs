use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// A resolved secret.
///
/// The value can only be read through [`SecretValue::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  /// Borrow the plaintext value.
  pub fn expose(&self) -> &str {
    &self.0
  }

  /// Consume the wrapper and return the plaintext value.
  pub fn into_exposed(self) -> String {
    self.0
  }
}

impl fmt::Debug for SecretValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("SecretValue").field(&REDACTED).finish()
  }
}

impl From<String> for SecretValue {
  fn from(value: String) -> Self {
    Self(value)
  }
}

impl From<&str> for SecretValue {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}
