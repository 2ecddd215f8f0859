use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or parsing a definition file.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed YAML definition: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("malformed JSON definition: {0}")]
  Json(#[from] serde_json::Error),
}
