use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Item;

/// Settings row for a prompt workflow, keyed by workflow name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkflowRecord {
  /// Endpoint the workflow talks to.
  pub api_endpoint: String,
  /// Id of the secret holding the endpoint's API key.
  pub api_key_id: String,
  /// Prompts, in the order they are sent.
  pub prompt_sequence: Vec<String>,
}

impl WorkflowRecord {
  /// Convert to a stored item under the given primary key.
  pub fn to_item(&self, key_attribute: &str, key: &str) -> Item {
    let mut item = Item::new();
    item.insert(key_attribute.to_string(), Value::String(key.to_string()));
    item.insert(
      "api-endpoint".to_string(),
      Value::String(self.api_endpoint.clone()),
    );
    item.insert(
      "api-key-id".to_string(),
      Value::String(self.api_key_id.clone()),
    );
    item.insert(
      "prompt-sequence".to_string(),
      Value::Array(
        self
          .prompt_sequence
          .iter()
          .cloned()
          .map(Value::String)
          .collect(),
      ),
    );
    item
  }
}
