use serde::{Deserialize, Serialize};

/// A path field that distinguishes "absent" from `null`.
///
/// An absent field means the root path `$`. An explicit `null` means the
/// data is discarded: an input or output path of `null` yields `{}`, a
/// result path of `null` drops the step result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathDef(pub Option<String>);

impl PathDef {
  pub fn root() -> Self {
    Self(Some("$".to_string()))
  }

  pub fn at(path: impl Into<String>) -> Self {
    Self(Some(path.into()))
  }

  pub fn discard() -> Self {
    Self(None)
  }

  pub fn is_root(&self) -> bool {
    self.0.as_deref() == Some("$")
  }
}

impl Default for PathDef {
  fn default() -> Self {
    Self::root()
  }
}

/// Where a step reads a scalar argument from.
///
/// ```json
/// { "value": "autoGenerateFullArticle" }
/// { "path": "$.api-key-id" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSourceDef {
  /// A literal string.
  Value(String),
  /// A path resolved against the step input.
  Path(String),
}
