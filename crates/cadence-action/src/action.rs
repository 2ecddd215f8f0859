use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::step::Step;

/// A declared input after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
  pub name: String,
  pub description: String,
  pub required: bool,
  pub default: Option<String>,
}

impl InputSpec {
  pub fn required(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      description: String::new(),
      required: true,
      default: None,
    }
  }

  pub fn optional(name: impl Into<String>, default: Option<&str>) -> Self {
    Self {
      name: name.into(),
      description: String::new(),
      required: false,
      default: default.map(str::to_string),
    }
  }
}

/// A locked action ready for execution. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
  pub name: String,
  pub description: String,
  /// Declared inputs in file order, keyed by name.
  pub inputs: IndexMap<String, InputSpec>,
  pub steps: Vec<Step>,
}

impl Action {
  /// Find a step by its `id`.
  pub fn get_step(&self, id: &str) -> Option<&Step> {
    self.steps.iter().find(|s| s.id.as_deref() == Some(id))
  }
}
