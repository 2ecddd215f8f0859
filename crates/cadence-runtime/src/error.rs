//! Runtime errors.

use cadence_resolver::InputError;

/// Errors that prevent a run from starting.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  /// Input resolution failed.
  #[error(transparent)]
  Input(#[from] InputError),
}

/// Errors raised while expanding `${{ ... }}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
  /// The placeholder names an input or variable that has no value.
  #[error("'{expression}' has no value")]
  Unresolved { expression: String },

  /// The placeholder is not `inputs.NAME` or `env.NAME`.
  #[error("unsupported expression '{expression}'")]
  Unsupported { expression: String },

  /// A `${{` without a closing `}}`.
  #[error("unterminated placeholder in '{template}'")]
  Unterminated { template: String },
}
