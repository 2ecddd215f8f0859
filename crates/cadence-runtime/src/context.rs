//! Explicit per-run state.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::result::StepResult;

/// Everything a run reads or accumulates, owned by exactly one run.
///
/// Nothing here is ambient: the caller environment is captured once, up
/// front, and only used to expand `${{ env.NAME }}`. Child processes still
/// inherit the real environment unmodified.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
  /// Resolved action inputs.
  pub inputs: IndexMap<String, String>,
  /// Snapshot of the caller environment for `${{ env.* }}` lookups.
  pub env: HashMap<String, String>,
  /// Directory relative working directories resolve against.
  pub base_dir: PathBuf,
  /// Tool directories installers added, prepended to `PATH` in order.
  pub path_additions: Vec<PathBuf>,
  /// Results of the steps that have completed so far.
  pub results: Vec<StepResult>,
}

impl ExecutionContext {
  /// Create a context with an empty environment snapshot.
  pub fn new(inputs: IndexMap<String, String>, base_dir: impl Into<PathBuf>) -> Self {
    Self {
      inputs,
      env: HashMap::new(),
      base_dir: base_dir.into(),
      path_additions: Vec::new(),
      results: Vec::new(),
    }
  }

  /// Snapshot the current process environment.
  ///
  /// Variables whose name or value is not valid UTF-8 cannot be referenced
  /// from a placeholder and are left out of the snapshot. Child processes
  /// still inherit them.
  pub fn capture_env(self) -> Self {
    self.with_env(utf8_vars(std::env::vars_os()))
  }

  pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
    self.env = env;
    self
  }

  /// Resolve a step's working directory against the base directory.
  pub fn resolve_dir(&self, dir: Option<&str>) -> PathBuf {
    match dir.map(str::trim).filter(|d| !d.is_empty()) {
      Some(d) if Path::new(d).is_absolute() => PathBuf::from(d),
      Some(d) => self.base_dir.join(d),
      None => self.base_dir.clone(),
    }
  }

  /// Add a tool directory for the remaining steps; duplicates are ignored.
  pub(crate) fn add_path(&mut self, path: PathBuf) {
    if !self.path_additions.contains(&path) {
      self.path_additions.push(path);
    }
  }
}

fn utf8_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> HashMap<String, String> {
  vars
    .into_iter()
    .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
    .collect()
}
