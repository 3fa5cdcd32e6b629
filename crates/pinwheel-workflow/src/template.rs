//! Payload templates.
//!
//! A template is a JSON object whose keys ending in `.$` hold paths into the
//! step input. Rendering resolves those paths and strips the suffix:
//!
//! ```json
//! { "SecretId.$": "$.api-key-id", "VersionStage": "AWSCURRENT" }
//! ```
//!
//! renders against `{ "api-key-id": "jurassic-1-key" }` as
//!
//! ```json
//! { "SecretId": "jurassic-1-key", "VersionStage": "AWSCURRENT" }
//! ```

use serde_json::{Map, Value};

use crate::path::{Path, PathError};

const PATH_SUFFIX: &str = ".$";

#[derive(Debug, Clone, PartialEq)]
pub enum Template {
  Object(Vec<(String, Template)>),
  Path(Path),
  Literal(Value),
}

impl Template {
  /// Compile a template from its JSON form.
  pub fn parse(value: &Value) -> Result<Self, PathError> {
    match value {
      Value::Object(entries) => {
        let mut fields = Vec::with_capacity(entries.len());
        for (key, entry) in entries {
          match key.strip_suffix(PATH_SUFFIX) {
            Some(name) => {
              let raw = entry.as_str().ok_or_else(|| PathError::Syntax {
                path: key.clone(),
                message: "value of a '.$' field must be a path string".to_string(),
              })?;
              fields.push((name.to_string(), Template::Path(Path::parse(raw)?)));
            }
            None => fields.push((key.clone(), Template::parse(entry)?)),
          }
        }
        Ok(Template::Object(fields))
      }
      other => Ok(Template::Literal(other.clone())),
    }
  }

  /// Render the template against a step input.
  pub fn render(&self, input: &Value) -> Result<Value, PathError> {
    match self {
      Template::Object(fields) => {
        let mut out = Map::with_capacity(fields.len());
        for (name, field) in fields {
          out.insert(name.clone(), field.render(input)?);
        }
        Ok(Value::Object(out))
      }
      Template::Path(path) => path.select(input),
      Template::Literal(value) => Ok(value.clone()),
    }
  }

  /// Every path referenced by the template.
  pub fn paths(&self) -> Vec<&Path> {
    match self {
      Template::Object(fields) => fields.iter().flat_map(|(_, f)| f.paths()).collect(),
      Template::Path(path) => vec![path],
      Template::Literal(_) => Vec::new(),
    }
  }
}
