//! Step runtime for cadence.
//!
//! Runs the steps of a resolved [`Action`](cadence_action::Action) in order,
//! one at a time, against an explicit per-run [`ExecutionContext`].
//!
//! # Architecture
//!
//! ```text
//! StepRunner
//! ├── new(config) - built-in installer + host pass-through invokers
//! ├── prepare(action, inputs, base_dir) -> ExecutionContext
//! └── execute(action, ctx, cancel) -> RunExecution
//!
//! RunExecution
//! └── wait() - sequential loop, fail-fast, cancellation at step boundaries
//!
//! PreparedStep
//! └── execute() - template expansion + shell or action invocation + timeout
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use cadence_runtime::{RunnerConfig, StepRunner};
//!
//! let runner = StepRunner::new(RunnerConfig::new("/home/ci/.cadence/tools"));
//! let ctx = runner.prepare(&action, &supplied, "/work")?;
//! let report = runner.execute(&action, ctx, cancel).wait().await;
//! std::process::exit(report.exit_code());
//! ```

mod context;
mod error;
mod events;
mod execution;
mod result;
mod runtime;
mod step;
mod template;

pub use context::ExecutionContext;
pub use error::{RuntimeError, TemplateError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use execution::RunExecution;
pub use result::{
  AbortReason, RunReport, RunState, RunStatus, StepFailure, StepOutcome, StepResult, StepState,
};
pub use runtime::{RunnerConfig, StepRunner};
pub use template::expand;

/// Process exit codes reported by the command line.
pub mod exit_code {
  /// Every step succeeded.
  pub const SUCCESS: i32 = 0;
  /// At least one step failed.
  pub const STEP_FAILED: i32 = 1;
  /// The action file could not be loaded, resolved or given its inputs.
  pub const LOAD_ERROR: i32 = 2;
  /// A placeholder could not be expanded.
  pub const TEMPLATE_ERROR: i32 = 3;
  /// The run was interrupted.
  pub const CANCELLED: i32 = 130;
}
