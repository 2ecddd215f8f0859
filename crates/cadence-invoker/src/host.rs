//! Pass-through to the host platform's action mechanism.

use async_trait::async_trait;
use tracing::info;

use cadence_action::ActionReference;

use crate::error::InvokeError;
use crate::invoker::{ActionInvoker, InvokeOutput, InvokeRequest};
use crate::process::{self, ProcessSpec};

/// A host program that knows how to run actions, e.g. a runner shim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
  pub program: String,
  pub args: Vec<String>,
}

impl HostCommand {
  /// Split a command line on whitespace: the first word is the program.
  pub fn parse(command_line: &str) -> Option<Self> {
    let mut words = command_line.split_whitespace().map(str::to_string);
    let program = words.next()?;
    Some(Self {
      program,
      args: words.collect(),
    })
  }
}

/// Generic fallback invoker.
///
/// With a host command configured, runs `program [args..] <name>@<ref>` with
/// each input exported as `INPUT_<NAME>`. Without one, every action is
/// reported as having no handler.
#[derive(Debug, Clone, Default)]
pub struct HostPassthrough {
  command: Option<HostCommand>,
}

impl HostPassthrough {
  pub fn new(command: Option<HostCommand>) -> Self {
    Self { command }
  }

  pub fn disabled() -> Self {
    Self { command: None }
  }
}

/// `node-version` -> `INPUT_NODE_VERSION`.
pub(crate) fn input_env_name(name: &str) -> String {
  let upper: String = name
    .trim()
    .chars()
    .map(|c| match c {
      '-' | ' ' => '_',
      c => c.to_ascii_uppercase(),
    })
    .collect();
  format!("INPUT_{}", upper)
}

fn reference_arg(reference: &ActionReference) -> String {
  match reference.git_ref() {
    Some(r) => format!("{}@{}", reference.name, r),
    None => reference.name.clone(),
  }
}

#[async_trait]
impl ActionInvoker for HostPassthrough {
  fn handles(&self, _reference: &ActionReference) -> bool {
    true
  }

  async fn invoke(&self, request: InvokeRequest<'_>) -> Result<InvokeOutput, InvokeError> {
    let command = self.command.as_ref().ok_or_else(|| InvokeError::NoHandler {
      reference: request.reference.to_string(),
    })?;

    let mut args = command.args.clone();
    args.push(reference_arg(request.reference));

    let env = request
      .env
      .iter()
      .map(|(k, v)| (k.clone(), v.clone()))
      .chain(
        request
          .inputs
          .iter()
          .map(|(k, v)| (input_env_name(k), v.clone())),
      )
      .collect();

    info!(
      program = %command.program,
      action = %request.reference,
      "delegating action to host"
    );

    let output = process::run(&ProcessSpec {
      program: command.program.clone(),
      args,
      working_directory: request.working_directory.to_path_buf(),
      env,
      path_prepend: request.path_additions.to_vec(),
      verbatim_args: false,
    })
    .await?;

    Ok(InvokeOutput {
      exit_code: output.exit_code,
      stdout: output.stdout,
      stderr: output.stderr,
      path_additions: Vec::new(),
    })
  }
}
