use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
  #[error("unsupported shell: {0}")]
  UnsupportedShell(String),

  #[error("invalid action reference '{reference}': {message}")]
  InvalidReference { reference: String, message: String },
}
