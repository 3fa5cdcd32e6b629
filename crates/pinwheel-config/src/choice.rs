use serde::{Deserialize, Serialize};

/// Numeric comparison used by a choice rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
  GreaterThan,
  GreaterThanEquals,
  LessThan,
  LessThanEquals,
  Equals,
}

impl Comparison {
  /// Apply the comparison to two numbers.
  pub fn holds(self, left: f64, right: f64) -> bool {
    match self {
      Comparison::GreaterThan => left > right,
      Comparison::GreaterThanEquals => left >= right,
      Comparison::LessThan => left < right,
      Comparison::LessThanEquals => left <= right,
      Comparison::Equals => left == right,
    }
  }

  pub fn symbol(self) -> &'static str {
    match self {
      Comparison::GreaterThan => ">",
      Comparison::GreaterThanEquals => ">=",
      Comparison::LessThan => "<",
      Comparison::LessThanEquals => "<=",
      Comparison::Equals => "==",
    }
  }
}

/// Right-hand side of a choice rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperandDef {
  /// Another numeric field of the step input.
  Path(String),
  /// A numeric literal.
  Value(f64),
}

/// One `(predicate, successor)` pair of a choice step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRuleDef {
  /// Path to the numeric field being compared.
  pub variable: String,
  pub comparison: Comparison,
  pub operand: OperandDef,
  /// Step to run when the rule matches.
  pub next: String,
}
