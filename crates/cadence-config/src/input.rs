//! Declared action inputs.
//!
//! ```yaml
//! inputs:
//!   working-directory:
//!     description: Directory the test suite runs in
//!     required: false
//!     default: "."
//! ```
//!
//! Values are opaque strings; no type coercion happens anywhere.

use serde::{Deserialize, Serialize};

use crate::scalar::Scalar;

/// A single declared input, keyed by name in [`ActionDef::inputs`](crate::ActionDef).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputDef {
  #[serde(default)]
  pub description: String,

  #[serde(default)]
  pub required: bool,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default: Option<Scalar>,
}
