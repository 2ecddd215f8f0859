use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::scalar::Scalar;

/// One entry of `runs.steps`, exactly as written.
///
/// A well-formed step has either `run` or `uses`; the resolver rejects
/// anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StepDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,

  /// Interpreter for `run` steps, e.g. `bash` or `pwsh`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub shell: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub working_directory: Option<String>,

  #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
  pub env: IndexMap<String, Scalar>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_minutes: Option<f64>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,

  /// Inline command text.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub run: Option<String>,

  /// External action reference, `name@ref`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uses: Option<String>,

  #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
  pub with: IndexMap<String, Scalar>,

  /// Content hash for a `uses` that names a tag.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pin: Option<String>,

  /// Human-readable tag for a `uses` that names a hash.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
}
