//! Invocation errors.

/// Errors that stop an action from being invoked.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
  /// The reference has a mutable tag but no content-addressed pin.
  #[error("action '{reference}' is not pinned to a content hash")]
  UnpinnedReference { reference: String },

  /// No invoker accepts the reference and no host program is configured.
  #[error("no handler for action '{reference}'")]
  NoHandler { reference: String },

  /// A required `with` value is missing.
  #[error("action '{reference}' requires input '{input}'")]
  MissingInput { reference: String, input: String },

  /// The process backing the action could not be started.
  #[error("failed to start '{program}'")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// A tool directory cannot be placed on `PATH`.
  #[error("cannot add '{path}' to PATH")]
  InvalidPath {
    path: String,
    #[source]
    source: std::env::JoinPathsError,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}
