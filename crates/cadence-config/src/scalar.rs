//! Scalar values that end up as strings.
//!
//! Action files routinely write `default: 20` or `node-version: 18.x`
//! without quotes. Every input, `with` and `env` value is an opaque string
//! once loaded, so numbers and booleans are accepted and rendered verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A string, number or boolean as written in the definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
  Bool(bool),
  Int(i64),
  Float(f64),
  String(String),
}

impl Scalar {
  /// Render the scalar as the string a step will see.
  pub fn into_string(self) -> String {
    match self {
      Scalar::String(s) => s,
      other => other.to_string(),
    }
  }
}

impl fmt::Display for Scalar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Scalar::Bool(b) => write!(f, "{b}"),
      Scalar::Int(i) => write!(f, "{i}"),
      Scalar::Float(x) => write!(f, "{x}"),
      Scalar::String(s) => f.write_str(s),
    }
  }
}

impl From<&str> for Scalar {
  fn from(value: &str) -> Self {
    Scalar::String(value.to_string())
  }
}

impl From<String> for Scalar {
  fn from(value: String) -> Self {
    Scalar::String(value)
  }
}
