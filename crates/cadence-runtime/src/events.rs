//! Run lifecycle events.
//!
//! Consumers follow a run's progress through these instead of parsing logs.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::result::{AbortReason, StepResult};

/// Events emitted during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// The run moved from `NotStarted` to `InProgress`.
  RunStarted { run_id: String, action: String },

  /// A step moved from `Pending` to `Running`.
  StepStarted {
    run_id: String,
    index: usize,
    step: String,
  },

  /// A step finished, successfully or not.
  StepFinished { run_id: String, result: StepResult },

  /// Every step executed.
  RunCompleted { run_id: String, success: bool },

  /// The run stopped early.
  RunAborted { run_id: String, reason: AbortReason },
}

/// Receives run lifecycle events.
///
/// The runner calls `notify` for each event; implementations decide what to
/// do with them.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded tokio channel.
///
/// A run emits a handful of events per step, so the channel stays small and
/// a slow consumer never stalls the runner.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with its receiving end.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self { sender }, receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
