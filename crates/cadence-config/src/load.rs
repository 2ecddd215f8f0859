//! Loading definitions from disk or strings.

use std::path::Path;

use crate::action::ActionDef;
use crate::error::ConfigError;

/// Load a definition file, picking the format from the extension.
///
/// `.json` files are parsed as JSON; everything else is treated as YAML,
/// which also accepts JSON documents.
pub fn from_path(path: impl AsRef<Path>) -> Result<ActionDef, ConfigError> {
  let path = path.as_ref();
  let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  let is_json = path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

  if is_json {
    from_json_str(&content)
  } else {
    from_yaml_str(&content)
  }
}

/// Parse a YAML definition.
pub fn from_yaml_str(content: &str) -> Result<ActionDef, ConfigError> {
  Ok(serde_yaml::from_str(content)?)
}

/// Parse a JSON definition.
pub fn from_json_str(content: &str) -> Result<ActionDef, ConfigError> {
  Ok(serde_json::from_str(content)?)
}
