//! Step and run results.

use serde::{Deserialize, Serialize};

use crate::exit_code;

/// Why a step failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepFailure {
  /// The command or action exited with a non-zero code.
  NonZeroExit { code: i32 },
  /// The process was terminated without an exit code.
  Terminated,
  /// The step ran past its timeout and was killed.
  Timeout { after_ms: u64 },
  /// The process could not be started.
  Spawn { message: String },
  /// The action reference has no content-addressed pin.
  UnpinnedReference { reference: String },
  /// The action could not be invoked.
  Invoke { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
  Succeeded,
  Failed { failure: StepFailure },
}

/// Lifecycle of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
  Pending,
  Running,
  Succeeded,
  Failed,
}

/// Result of one completed step. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  /// Process exit code, if the step got far enough to have one.
  pub exit_code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
  pub duration_ms: u64,
  pub outcome: StepOutcome,
}

impl StepResult {
  pub fn succeeded(&self) -> bool {
    matches!(self.outcome, StepOutcome::Succeeded)
  }

  pub fn failure(&self) -> Option<&StepFailure> {
    match &self.outcome {
      StepOutcome::Succeeded => None,
      StepOutcome::Failed { failure } => Some(failure),
    }
  }

  pub fn state(&self) -> StepState {
    if self.succeeded() {
      StepState::Succeeded
    } else {
      StepState::Failed
    }
  }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
  NotStarted,
  InProgress,
  Completed,
  Aborted,
}

/// Why a run stopped before executing every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbortReason {
  /// A step failed with fail-fast enabled.
  Failed { step: String },
  /// The run was cancelled at a step boundary.
  Cancelled,
  /// A step's placeholders could not be expanded.
  TemplateResolution { step: String, message: String },
}

/// Terminal status of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
  /// Every step executed, successfully or not.
  Completed,
  Aborted(AbortReason),
}

impl RunStatus {
  pub fn state(&self) -> RunState {
    match self {
      RunStatus::Completed => RunState::Completed,
      RunStatus::Aborted(_) => RunState::Aborted,
    }
  }
}

/// Everything a run produced, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
  pub run_id: String,
  pub action: String,
  pub status: RunStatus,
  pub results: Vec<StepResult>,
  /// Steps that were never started.
  pub not_run: Vec<String>,
  pub duration_ms: u64,
}

impl RunReport {
  /// True when the run completed and every step succeeded.
  pub fn success(&self) -> bool {
    self.status == RunStatus::Completed && self.results.iter().all(StepResult::succeeded)
  }

  /// Process exit code for this report.
  ///
  /// See [`exit_code`] for the values.
  pub fn exit_code(&self) -> i32 {
    match &self.status {
      RunStatus::Aborted(AbortReason::Cancelled) => exit_code::CANCELLED,
      RunStatus::Aborted(AbortReason::TemplateResolution { .. }) => exit_code::TEMPLATE_ERROR,
      RunStatus::Aborted(AbortReason::Failed { .. }) => exit_code::STEP_FAILED,
      RunStatus::Completed if self.success() => exit_code::SUCCESS,
      RunStatus::Completed => exit_code::STEP_FAILED,
    }
  }
}
