use cadence_action::ActionError;
use thiserror::Error;

/// Errors that can occur while validating a definition into an action.
#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
  /// `runs.using` names a mode other than composite steps.
  #[error("unsupported execution mode '{using}' (expected 'composite')")]
  UnsupportedRunsMode { using: String },

  /// A step or the action defaults name an unknown shell.
  #[error("step '{step}': unsupported shell '{shell}'")]
  UnsupportedShell { step: String, shell: String },

  /// A `run` step with no shell of its own and no default.
  #[error("step '{step}': 'run' steps require a shell")]
  MissingShell { step: String },

  /// A step that is neither exactly a `run` nor exactly a `uses`.
  #[error("step '{step}': {message}")]
  InvalidStep { step: String, message: String },

  /// A `uses` value that does not parse, or a bad explicit pin.
  #[error("step '{step}': {source}")]
  InvalidReference {
    step: String,
    #[source]
    source: ActionError,
  },

  #[error("duplicate step id: {id}")]
  DuplicateStepId { id: String },

  #[error("step '{step}': timeout must be positive")]
  InvalidTimeout { step: String },
}

/// Errors raised while resolving caller-supplied inputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
  #[error("missing required input: {0}")]
  MissingRequiredInput(String),
}
