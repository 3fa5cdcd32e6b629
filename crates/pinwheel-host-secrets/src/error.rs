use thiserror::Error;

/// Errors from a secret store. Messages carry the secret id, never a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretError {
  #[error("secret not found: {secret_id}")]
  NotFound { secret_id: String },

  #[error("access denied to secret: {secret_id}")]
  AccessDenied { secret_id: String },

  #[error("secret backend error: {message}")]
  Backend { message: String },
}
