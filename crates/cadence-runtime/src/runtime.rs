//! Step runner.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cadence_action::Action;
use cadence_invoker::{HostCommand, HostPassthrough, Invokers, SetupRuntime};
use cadence_resolver::resolve_inputs;
use tokio_util::sync::CancellationToken;

use crate::context::ExecutionContext;
use crate::error::RuntimeError;
use crate::events::{ExecutionNotifier, NoopNotifier};
use crate::execution::RunExecution;
use crate::result::RunReport;

/// Configuration for the step runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
  /// Abort the remaining steps after the first failed step.
  pub fail_fast: bool,
  /// Timeout for steps that do not declare their own.
  pub default_timeout: Option<Duration>,
  /// Root of the runtime tool cache used by setup actions.
  pub tool_cache: PathBuf,
  /// Program that runs actions no built-in invoker handles.
  pub host_command: Option<HostCommand>,
}

impl RunnerConfig {
  pub fn new(tool_cache: impl Into<PathBuf>) -> Self {
    Self {
      fail_fast: true,
      default_timeout: None,
      tool_cache: tool_cache.into(),
      host_command: None,
    }
  }
}

/// The step runner.
///
/// Holds configuration and invokers; every run gets its own
/// [`ExecutionContext`].
pub struct StepRunner {
  pub(crate) config: RunnerConfig,
  pub(crate) invokers: Invokers,
  pub(crate) notifier: Arc<dyn ExecutionNotifier>,
}

impl StepRunner {
  /// Create a runner with the built-in runtime installer and a host
  /// pass-through fallback.
  pub fn new(config: RunnerConfig) -> Self {
    let invokers = Invokers::new(Arc::new(HostPassthrough::new(config.host_command.clone())))
      .with(Arc::new(SetupRuntime::new(config.tool_cache.clone())));

    Self {
      config,
      invokers,
      notifier: Arc::new(NoopNotifier),
    }
  }

  /// Replace the invokers.
  pub fn with_invokers(mut self, invokers: Invokers) -> Self {
    self.invokers = invokers;
    self
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn ExecutionNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn config(&self) -> &RunnerConfig {
    &self.config
  }

  /// Resolve caller inputs and build the context for one run.
  ///
  /// Fails before any step runs if a required input is missing.
  pub fn prepare(
    &self,
    action: &Action,
    supplied: &HashMap<String, String>,
    base_dir: impl Into<PathBuf>,
  ) -> Result<ExecutionContext, RuntimeError> {
    let inputs = resolve_inputs(&action.inputs, supplied)?;
    Ok(ExecutionContext::new(inputs, base_dir).capture_env())
  }

  /// Execute an action against a prepared context.
  ///
  /// Returns a `RunExecution` handle. Call `.wait()` to run it.
  pub fn execute<'a>(
    &'a self,
    action: &'a Action,
    ctx: ExecutionContext,
    cancel: CancellationToken,
  ) -> RunExecution<'a> {
    let run_id = uuid::Uuid::new_v4().to_string();
    RunExecution::new(self, action, run_id, ctx, cancel)
  }

  /// Prepare and execute in one call.
  pub async fn run(
    &self,
    action: &Action,
    supplied: &HashMap<String, String>,
    base_dir: impl Into<PathBuf>,
    cancel: CancellationToken,
  ) -> Result<RunReport, RuntimeError> {
    let ctx = self.prepare(action, supplied, base_dir)?;
    Ok(self.execute(action, ctx, cancel).wait().await)
  }
}
