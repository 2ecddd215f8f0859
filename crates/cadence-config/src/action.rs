use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::InputDef;
use crate::step::StepDef;

/// A composite action definition before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
  pub name: String,

  #[serde(default)]
  pub description: String,

  /// Declared inputs in file order.
  #[serde(default)]
  pub inputs: IndexMap<String, InputDef>,

  pub runs: RunsDef,
}

/// The `runs` block: execution mode plus the ordered steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunsDef {
  /// Execution mode tag. Only `composite` is executable.
  pub using: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub defaults: Option<DefaultsDef>,

  #[serde(default)]
  pub steps: Vec<StepDef>,
}

/// Action-level defaults that steps inherit unless they override them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DefaultsDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub shell: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub working_directory: Option<String>,
}
