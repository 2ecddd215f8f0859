use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;

use cadence_action::ActionReference;

use crate::error::InvokeError;

/// Everything an invoker gets to see about one `uses` step.
#[derive(Debug, Clone, Copy)]
pub struct InvokeRequest<'a> {
  pub reference: &'a ActionReference,
  /// `with` values after template expansion.
  pub inputs: &'a IndexMap<String, String>,
  pub working_directory: &'a Path,
  /// Explicit step-level environment additions.
  pub env: &'a IndexMap<String, String>,
  /// Tool directories earlier steps asked to put on `PATH`.
  pub path_additions: &'a [PathBuf],
}

/// What an invoked action produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvokeOutput {
  /// `None` when the process was terminated by a signal.
  pub exit_code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
  /// Directories to prepend to `PATH` for the remaining steps.
  pub path_additions: Vec<PathBuf>,
}

impl InvokeOutput {
  pub fn success(stdout: impl Into<String>) -> Self {
    Self {
      exit_code: Some(0),
      stdout: stdout.into(),
      ..Default::default()
    }
  }

  pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
    Self {
      exit_code: Some(exit_code),
      stderr: stderr.into(),
      ..Default::default()
    }
  }

  pub fn succeeded(&self) -> bool {
    self.exit_code == Some(0)
  }
}

/// Executes one kind of external action.
///
/// Implementations never see unpinned references; [`Invokers`](crate::Invokers)
/// rejects those first.
#[async_trait]
pub trait ActionInvoker: Send + Sync {
  /// Whether this invoker knows how to run `reference`.
  fn handles(&self, reference: &ActionReference) -> bool;

  /// Run the action.
  ///
  /// A non-zero exit is reported through [`InvokeOutput::exit_code`]; `Err`
  /// is reserved for actions that could not be attempted at all.
  async fn invoke(&self, request: InvokeRequest<'_>) -> Result<InvokeOutput, InvokeError>;
}
