//! Child process execution with captured output.
//!
//! The child inherits the caller's environment. Only the explicit `env`
//! entries and `PATH` prefixes of a [`ProcessSpec`] are layered on top, and
//! only for that one child.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::InvokeError;

/// A fully resolved process launch.
#[derive(Debug, Clone, Default)]
pub struct ProcessSpec {
  pub program: String,
  pub args: Vec<String>,
  pub working_directory: PathBuf,
  pub env: Vec<(String, String)>,
  pub path_prepend: Vec<PathBuf>,
  /// Pass `args` without quoting or escaping. Only affects Windows.
  pub verbatim_args: bool,
}

/// Exit status and captured streams of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
  pub exit_code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

/// `PATH` with `prepend` placed ahead of the inherited value.
///
/// Fails if a prepended directory contains the platform's path separator.
pub fn prepend_path(prepend: &[PathBuf]) -> Result<Option<OsString>, InvokeError> {
  if prepend.is_empty() {
    return Ok(None);
  }

  for dir in prepend {
    if let Err(source) = std::env::join_paths([dir]) {
      warn!(path = %dir.display(), "tool directory cannot be added to PATH");
      return Err(InvokeError::InvalidPath {
        path: dir.display().to_string(),
        source,
      });
    }
  }

  let inherited = std::env::var_os("PATH").unwrap_or_default();
  let paths = prepend
    .iter()
    .cloned()
    .chain(std::env::split_paths(&inherited));
  // Entries split from the inherited value never contain a separator.
  std::env::join_paths(paths)
    .map(Some)
    .map_err(|source| InvokeError::InvalidPath {
      path: "PATH".to_string(),
      source,
    })
}

#[cfg(windows)]
fn push_args(cmd: &mut Command, spec: &ProcessSpec) {
  if spec.verbatim_args {
    for arg in &spec.args {
      cmd.raw_arg(arg);
    }
  } else {
    cmd.args(&spec.args);
  }
}

#[cfg(not(windows))]
fn push_args(cmd: &mut Command, spec: &ProcessSpec) {
  cmd.args(&spec.args);
}

/// Run the process to completion and capture its output.
///
/// The child is killed if the returned future is dropped, which is how step
/// timeouts stop it.
pub async fn run(spec: &ProcessSpec) -> Result<ProcessOutput, InvokeError> {
  let mut cmd = Command::new(&spec.program);
  cmd
    .current_dir(&spec.working_directory)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

  push_args(&mut cmd, spec);
  if let Some(path) = prepend_path(&spec.path_prepend)? {
    cmd.env("PATH", path);
  }
  for (key, value) in &spec.env {
    cmd.env(key, value);
  }

  debug!(
    program = %spec.program,
    cwd = %spec.working_directory.display(),
    "spawning process"
  );

  let output = cmd.output().await.map_err(|source| InvokeError::Spawn {
    program: spec.program.clone(),
    source,
  })?;

  Ok(ProcessOutput {
    exit_code: output.status.code(),
    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
  })
}
