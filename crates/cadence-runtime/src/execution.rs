//! Run execution.

use std::time::Instant;

use cadence_action::Action;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::context::ExecutionContext;
use crate::events::ExecutionEvent;
use crate::result::{AbortReason, RunReport, RunState, RunStatus, StepState};
use crate::runtime::StepRunner;
use crate::step::PreparedStep;

/// A handle to a run.
///
/// Owns the run's context exclusively. Call `.wait()` to execute the steps
/// and get the report.
pub struct RunExecution<'a> {
  runner: &'a StepRunner,
  action: &'a Action,
  run_id: String,
  ctx: ExecutionContext,
  cancel: CancellationToken,
  state: RunState,
}

impl<'a> RunExecution<'a> {
  pub(crate) fn new(
    runner: &'a StepRunner,
    action: &'a Action,
    run_id: String,
    ctx: ExecutionContext,
    cancel: CancellationToken,
  ) -> Self {
    Self {
      runner,
      action,
      run_id,
      ctx,
      cancel,
      state: RunState::NotStarted,
    }
  }

  pub fn run_id(&self) -> &str {
    &self.run_id
  }

  pub fn state(&self) -> RunState {
    self.state
  }

  /// Run every step in order and report what happened.
  #[instrument(
    name = "run_execute",
    skip(self),
    fields(run_id = %self.run_id, action = %self.action.name)
  )]
  pub async fn wait(mut self) -> RunReport {
    let started = Instant::now();
    let fail_fast = self.runner.config.fail_fast;

    info!(
      steps = self.action.steps.len(),
      fail_fast,
      base_dir = %self.ctx.base_dir.display(),
      "run_started"
    );
    self.state = RunState::InProgress;
    self.notify(ExecutionEvent::RunStarted {
      run_id: self.run_id.clone(),
      action: self.action.name.clone(),
    });

    let status = self.run_loop(fail_fast).await;
    self.state = status.state();

    let success = status == RunStatus::Completed && self.ctx.results.iter().all(|r| r.succeeded());
    match &status {
      RunStatus::Completed => {
        info!(success, "run_completed");
        self.notify(ExecutionEvent::RunCompleted {
          run_id: self.run_id.clone(),
          success,
        });
      }
      RunStatus::Aborted(reason) => {
        warn!(reason = ?reason, "run_aborted");
        self.notify(ExecutionEvent::RunAborted {
          run_id: self.run_id.clone(),
          reason: reason.clone(),
        });
      }
    }

    let not_run = self
      .action
      .steps
      .iter()
      .skip(self.ctx.results.len())
      .map(|s| s.name.clone())
      .collect();

    RunReport {
      run_id: self.run_id,
      action: self.action.name.clone(),
      status,
      results: self.ctx.results,
      not_run,
      duration_ms: started.elapsed().as_millis() as u64,
    }
  }

  /// Run steps until the end, a fail-fast failure, a template error or cancellation.
  async fn run_loop(&mut self, fail_fast: bool) -> RunStatus {
    let action = self.action;

    for (index, step) in action.steps.iter().enumerate() {
      if self.cancel.is_cancelled() {
        warn!(step = %step.name, "run cancelled before step");
        return RunStatus::Aborted(AbortReason::Cancelled);
      }

      let prepared = match PreparedStep::prepare(step, &self.ctx) {
        Ok(prepared) => prepared,
        Err(e) => {
          error!(step = %step.name, error = %e, "template resolution failed");
          return RunStatus::Aborted(AbortReason::TemplateResolution {
            step: step.name.clone(),
            message: e.to_string(),
          });
        }
      };

      info!(index, step = %step.name, state = ?StepState::Running, "step_started");
      self.notify(ExecutionEvent::StepStarted {
        run_id: self.run_id.clone(),
        index,
        step: step.name.clone(),
      });

      let timeout = step.timeout.or(self.runner.config.default_timeout);
      let run = prepared
        .execute(&self.runner.invokers, &self.ctx.path_additions, timeout)
        .await;

      for path in run.path_additions {
        info!(path = %path.display(), "adding tool path for remaining steps");
        self.ctx.add_path(path);
      }

      let result = run.result;
      if result.succeeded() {
        info!(
          step = %result.name,
          duration_ms = result.duration_ms,
          "step_completed"
        );
      } else {
        error!(
          step = %result.name,
          exit_code = ?result.exit_code,
          failure = ?result.failure(),
          duration_ms = result.duration_ms,
          "step_failed"
        );
      }

      let failed = !result.succeeded();
      self.notify(ExecutionEvent::StepFinished {
        run_id: self.run_id.clone(),
        result: result.clone(),
      });
      self.ctx.results.push(result);

      if failed && fail_fast {
        return RunStatus::Aborted(AbortReason::Failed {
          step: step.name.clone(),
        });
      }
    }

    RunStatus::Completed
  }

  fn notify(&self, event: ExecutionEvent) {
    self.runner.notifier.notify(event);
  }
}
