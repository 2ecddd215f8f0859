//! Single step execution.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::{debug, instrument};

use cadence_action::{ActionReference, Shell, Step, StepKind};
use cadence_invoker::process::{self, ProcessSpec};
use cadence_invoker::{InvokeError, InvokeOutput, InvokeRequest, Invokers};

use crate::context::ExecutionContext;
use crate::error::TemplateError;
use crate::result::{StepFailure, StepOutcome, StepResult};
use crate::template::{Scope, expand, expand_in};

/// Step-level lookup: the step's own `env` shadows the captured environment.
struct StepScope<'a> {
  ctx: &'a ExecutionContext,
  env: &'a IndexMap<String, String>,
}

impl Scope for StepScope<'_> {
  fn input(&self, name: &str) -> Option<&str> {
    self.ctx.input(name)
  }

  fn env(&self, name: &str) -> Option<&str> {
    self
      .env
      .get(name)
      .map(String::as_str)
      .or_else(|| self.ctx.env(name))
  }
}

enum PreparedKind<'a> {
  Shell {
    shell: Shell,
    script: String,
  },
  Action {
    reference: &'a ActionReference,
    with: IndexMap<String, String>,
  },
}

/// A step with every template expanded, ready to run.
pub(crate) struct PreparedStep<'a> {
  step: &'a Step,
  working_directory: PathBuf,
  env: IndexMap<String, String>,
  kind: PreparedKind<'a>,
}

/// A finished step plus any tool paths it contributed.
pub(crate) struct StepRun {
  pub result: StepResult,
  pub path_additions: Vec<PathBuf>,
}

enum Attempt {
  Finished(InvokeOutput),
  Error(InvokeError),
  TimedOut(Duration),
}

impl<'a> PreparedStep<'a> {
  /// Expand the step's templates against the current context.
  pub(crate) fn prepare(step: &'a Step, ctx: &ExecutionContext) -> Result<Self, TemplateError> {
    let env = step
      .env
      .iter()
      .map(|(k, v)| Ok((k.clone(), expand(v, ctx)?)))
      .collect::<Result<IndexMap<_, _>, TemplateError>>()?;

    let scope = StepScope { ctx, env: &env };

    let dir = step
      .working_directory
      .as_deref()
      .map(|d| expand_in(d, &scope))
      .transpose()?;
    let working_directory = ctx.resolve_dir(dir.as_deref());

    let kind = match &step.kind {
      StepKind::Run { command } => PreparedKind::Shell {
        shell: step.shell.unwrap_or_else(Shell::platform_default),
        script: expand_in(command, &scope)?,
      },
      StepKind::Uses { reference, with } => PreparedKind::Action {
        reference,
        with: with
          .iter()
          .map(|(k, v)| Ok((k.clone(), expand_in(v, &scope)?)))
          .collect::<Result<_, TemplateError>>()?,
      },
    };

    Ok(Self {
      step,
      working_directory,
      env,
      kind,
    })
  }

  /// Run the step to completion, honoring `timeout`.
  #[instrument(
    name = "step_execute",
    skip_all,
    fields(step = %self.step.name, cwd = %self.working_directory.display())
  )]
  pub(crate) async fn execute(
    &self,
    invokers: &Invokers,
    path_additions: &[PathBuf],
    timeout: Option<Duration>,
  ) -> StepRun {
    let started = Instant::now();
    let attempt = self.attempt(invokers, path_additions);

    let attempt = match timeout {
      Some(limit) => match tokio::time::timeout(limit, attempt).await {
        Ok(a) => a,
        Err(_) => Attempt::TimedOut(limit),
      },
      None => attempt.await,
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    self.finish(attempt, duration_ms)
  }

  async fn attempt(&self, invokers: &Invokers, path_additions: &[PathBuf]) -> Attempt {
    let result = match &self.kind {
      PreparedKind::Shell { shell, script } => {
        debug!(shell = %shell, "running inline command");
        let spec = ProcessSpec {
          program: shell.program().to_string(),
          args: shell.args(script),
          working_directory: self.working_directory.clone(),
          env: self
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
          path_prepend: path_additions.to_vec(),
          verbatim_args: shell.verbatim_args(),
        };
        process::run(&spec).await.map(|out| InvokeOutput {
          exit_code: out.exit_code,
          stdout: out.stdout,
          stderr: out.stderr,
          path_additions: Vec::new(),
        })
      }
      PreparedKind::Action { reference, with } => {
        debug!(action = %reference, "invoking action");
        invokers
          .invoke(InvokeRequest {
            reference,
            inputs: with,
            working_directory: &self.working_directory,
            env: &self.env,
            path_additions,
          })
          .await
      }
    };

    match result {
      Ok(output) => Attempt::Finished(output),
      Err(e) => Attempt::Error(e),
    }
  }

  fn finish(&self, attempt: Attempt, duration_ms: u64) -> StepRun {
    let (exit_code, stdout, stderr, outcome, path_additions) = match attempt {
      Attempt::Finished(output) => {
        let outcome = match output.exit_code {
          Some(0) => StepOutcome::Succeeded,
          Some(code) => StepOutcome::Failed {
            failure: StepFailure::NonZeroExit { code },
          },
          None => StepOutcome::Failed {
            failure: StepFailure::Terminated,
          },
        };
        // Tool paths only count when the install itself succeeded.
        let paths = if output.succeeded() {
          output.path_additions
        } else {
          Vec::new()
        };
        (output.exit_code, output.stdout, output.stderr, outcome, paths)
      }
      Attempt::Error(e) => {
        let message = error_chain(&e);
        let failure = match e {
          InvokeError::UnpinnedReference { reference } => {
            StepFailure::UnpinnedReference { reference }
          }
          InvokeError::Spawn { .. } => StepFailure::Spawn {
            message: message.clone(),
          },
          _ => StepFailure::Invoke {
            message: message.clone(),
          },
        };
        (
          None,
          String::new(),
          format!("{}\n", message),
          StepOutcome::Failed { failure },
          Vec::new(),
        )
      }
      Attempt::TimedOut(limit) => {
        let after_ms = limit.as_millis() as u64;
        (
          None,
          String::new(),
          format!("step timed out after {} ms\n", after_ms),
          StepOutcome::Failed {
            failure: StepFailure::Timeout { after_ms },
          },
          Vec::new(),
        )
      }
    };

    StepRun {
      result: StepResult {
        name: self.step.name.clone(),
        id: self.step.id.clone(),
        exit_code,
        stdout,
        stderr,
        duration_ms,
        outcome,
      },
      path_additions,
    }
  }
}

/// Render an error with its sources, `outer: inner: ...`.
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
  let mut message = e.to_string();
  let mut source = e.source();
  while let Some(inner) = source {
    message.push_str(": ");
    message.push_str(&inner.to_string());
    source = inner.source();
  }
  message
}
