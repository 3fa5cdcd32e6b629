//! In-memory stores seeded from a fixtures file.
//!
//! ```json
//! {
//!   "tables": {
//!     "gpt3-workflow-dev001": {
//!       "key_attribute": "gpt3-workflow-id",
//!       "items": [{ "gpt3-workflow-id": "autoGenerateFullArticle", "api-key-id": "..." }]
//!     }
//!   },
//!   "secrets": { "jurassic-1-key": "..." },
//!   "denied_secrets": []
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use pinwheel_host_kv::{InMemoryKvStore, Item};
use pinwheel_host_secrets::InMemorySecretStore;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixtures {
  #[serde(default)]
  pub tables: BTreeMap<String, TableFixture>,
  #[serde(default)]
  pub secrets: BTreeMap<String, String>,
  #[serde(default)]
  pub denied_secrets: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableFixture {
  pub key_attribute: String,
  #[serde(default)]
  pub items: Vec<Item>,
}

impl Fixtures {
  pub async fn load(path: &Path) -> Result<Self> {
    let content = tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("failed to read fixtures file: {}", path.display()))?;
    serde_json::from_str(&content)
      .with_context(|| format!("failed to parse fixtures file: {}", path.display()))
  }

  pub fn kv_store(&self) -> Result<InMemoryKvStore> {
    let store = InMemoryKvStore::new();
    for (name, table) in &self.tables {
      store.create_table(name, &table.key_attribute);
      for item in &table.items {
        store
          .put_item(name, item.clone())
          .with_context(|| format!("invalid item in fixture table '{}'", name))?;
      }
    }
    Ok(store)
  }

  pub fn secret_store(&self) -> InMemorySecretStore {
    let store = InMemorySecretStore::new();
    for (id, value) in &self.secrets {
      store.insert(id.clone(), value.clone());
    }
    for id in &self.denied_secrets {
      store.deny(id.clone());
    }
    store
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pinwheel_host_kv::KvStore;
  use pinwheel_host_secrets::{SecretError, SecretStore};
  use std::io::Write;

  #[tokio::test]
  async fn test_load_fixtures() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      r#"{{
        "tables": {{
          "gpt3-workflow-dev001": {{
            "key_attribute": "gpt3-workflow-id",
            "items": [{{ "gpt3-workflow-id": "autoGenerateFullArticle", "api-key-id": "k1" }}]
          }}
        }},
        "secrets": {{ "k1": "s3cr3t" }},
        "denied_secrets": ["k2"]
      }}"#
    )
    .unwrap();

    let fixtures = Fixtures::load(file.path()).await.unwrap();
    let kv = fixtures.kv_store().unwrap();
    let item = kv
      .get_item("gpt3-workflow-dev001", "gpt3-workflow-id", "autoGenerateFullArticle")
      .await
      .unwrap()
      .unwrap();
    assert_eq!(item["api-key-id"], "k1");

    let secrets = fixtures.secret_store();
    assert_eq!(secrets.get_secret("k1").await.unwrap().expose(), "s3cr3t");
    assert_eq!(
      secrets.get_secret("k2").await.unwrap_err(),
      SecretError::AccessDenied {
        secret_id: "k2".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_item_without_key_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      r#"{{ "tables": {{ "t": {{ "key_attribute": "id", "items": [{{ "other": 1 }}] }} }} }}"#
    )
    .unwrap();

    let fixtures = Fixtures::load(file.path()).await.unwrap();
    let err = fixtures.kv_store().unwrap_err();
    assert!(err.to_string().contains("fixture table 't'"));
  }

  #[tokio::test]
  async fn test_missing_file_reports_path() {
    let err = Fixtures::load(Path::new("/nonexistent/fixtures.json"))
      .await
      .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/fixtures.json"));
  }
}
