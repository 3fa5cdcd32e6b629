//! A small JSONPath subset for addressing parts of the execution context.
//!
//! Supported syntax:
//!
//! ```text
//! $                      the whole document
//! $.field.nested         dotted fields (anything except '.' and '[')
//! $['api-endpoint']      quoted fields
//! $.items[0]             array indexes
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while parsing, reading or writing a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
  #[error("invalid path '{path}': {message}")]
  Syntax { path: String, message: String },

  #[error("path '{path}' did not match the input")]
  NoMatch { path: String },

  #[error("cannot write to '{path}': {message}")]
  Unwritable { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Field(String),
  Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
  raw: String,
  segments: Vec<Segment>,
}

impl Path {
  /// The root path `$`.
  pub fn root() -> Self {
    Self {
      raw: "$".to_string(),
      segments: Vec::new(),
    }
  }

  pub fn parse(raw: &str) -> Result<Self, PathError> {
    let syntax = |message: &str| PathError::Syntax {
      path: raw.to_string(),
      message: message.to_string(),
    };

    let rest = raw
      .strip_prefix('$')
      .ok_or_else(|| syntax("must start with '$'"))?;
    let chars: Vec<char> = rest.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    while i < chars.len() {
      match chars[i] {
        '.' => {
          let start = i + 1;
          let mut end = start;
          while end < chars.len() && chars[end] != '.' && chars[end] != '[' {
            end += 1;
          }
          if end == start {
            return Err(syntax("empty field name"));
          }
          segments.push(Segment::Field(chars[start..end].iter().collect()));
          i = end;
        }
        '[' if chars.get(i + 1) == Some(&'\'') => {
          let start = i + 2;
          let mut end = start;
          while end + 1 < chars.len() && !(chars[end] == '\'' && chars[end + 1] == ']') {
            end += 1;
          }
          if end + 1 >= chars.len() {
            return Err(syntax("unterminated quoted field"));
          }
          segments.push(Segment::Field(chars[start..end].iter().collect()));
          i = end + 2;
        }
        '[' => {
          let start = i + 1;
          let mut end = start;
          while end < chars.len() && chars[end] != ']' {
            end += 1;
          }
          if end >= chars.len() {
            return Err(syntax("unterminated index"));
          }
          let digits: String = chars[start..end].iter().collect();
          let index = digits
            .parse::<usize>()
            .map_err(|_| syntax("index must be a non-negative integer"))?;
          segments.push(Segment::Index(index));
          i = end + 1;
        }
        _ => return Err(syntax("expected '.' or '['")),
      }
    }

    Ok(Self {
      raw: raw.to_string(),
      segments,
    })
  }

  pub fn is_root(&self) -> bool {
    self.segments.is_empty()
  }

  pub fn as_str(&self) -> &str {
    &self.raw
  }

  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }

  /// Find the value this path points at, if any.
  pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
    let mut current = value;
    for segment in &self.segments {
      current = match segment {
        Segment::Field(name) => current.as_object()?.get(name)?,
        Segment::Index(index) => current.as_array()?.get(*index)?,
      };
    }
    Some(current)
  }

  /// Like [`Path::resolve`], but a miss is an error.
  pub fn select(&self, value: &Value) -> Result<Value, PathError> {
    self
      .resolve(value)
      .cloned()
      .ok_or_else(|| PathError::NoMatch {
        path: self.raw.clone(),
      })
  }

  /// Write `value` at this path, replacing whatever subtree was there.
  ///
  /// Missing intermediate fields are created as objects. Writing through a
  /// scalar or past the end of an array is an error.
  pub fn write(&self, target: &mut Value, value: Value) -> Result<(), PathError> {
    let unwritable = |message: String| PathError::Unwritable {
      path: self.raw.clone(),
      message,
    };

    let mut current = target;
    for (i, segment) in self.segments.iter().enumerate() {
      let last = i + 1 == self.segments.len();
      match segment {
        Segment::Field(name) => {
          if current.is_null() {
            *current = Value::Object(Map::new());
          }
          let object = current
            .as_object_mut()
            .ok_or_else(|| unwritable(format!("parent of '{}' is not an object", name)))?;
          if last {
            object.insert(name.clone(), value);
            return Ok(());
          }
          current = object.entry(name.clone()).or_insert(Value::Null);
        }
        Segment::Index(index) => {
          let array = current
            .as_array_mut()
            .ok_or_else(|| unwritable(format!("parent of [{}] is not an array", index)))?;
          let slot = array
            .get_mut(*index)
            .ok_or_else(|| unwritable(format!("index {} is out of bounds", index)))?;
          if last {
            *slot = value;
            return Ok(());
          }
          current = slot;
        }
      }
    }

    *current = value;
    Ok(())
  }
}

impl FromStr for Path {
  type Err = PathError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl fmt::Display for Path {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}
