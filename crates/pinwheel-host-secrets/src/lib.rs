//! Secret resolution for pinwheel.
//!
//! Secret values never leave this crate in printable form: [`SecretValue`]
//! redacts itself in `Debug`, does not implement `Display`, and errors only
//! ever name the secret id.

mod error;
mod memory;
mod value;

use std::future::Future;
use std::pin::Pin;

pub use error::SecretError;
pub use memory::InMemorySecretStore;
pub use value::SecretValue;

/// Read access to a secret store.
pub trait SecretStore: Send + Sync {
  /// Fetch the current value of a secret.
  fn get_secret(
    &self,
    secret_id: &str,
  ) -> Pin<Box<dyn Future<Output = Result<SecretValue, SecretError>> + Send + '_>>;
}
