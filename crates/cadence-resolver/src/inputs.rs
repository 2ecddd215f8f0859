//! Input resolution.
//!
//! Declared inputs are matched against the values a caller supplied. The
//! result only contains inputs that have a value; an optional input with no
//! default and no caller value is simply absent, and any template that refers
//! to it fails later, at the step that uses it.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::warn;

use cadence_action::InputSpec;

use crate::error::InputError;

/// Resolve declared inputs against caller-supplied values.
///
/// Precedence per input: supplied value, then default, then (if required)
/// [`InputError::MissingRequiredInput`]. Supplied names that are not declared
/// are ignored so older definitions keep working with newer callers.
pub fn resolve_inputs(
  declared: &IndexMap<String, InputSpec>,
  supplied: &HashMap<String, String>,
) -> Result<IndexMap<String, String>, InputError> {
  let mut resolved = IndexMap::with_capacity(declared.len());

  for (name, spec) in declared {
    if let Some(value) = supplied.get(name) {
      resolved.insert(name.clone(), value.clone());
    } else if let Some(default) = &spec.default {
      resolved.insert(name.clone(), default.clone());
    } else if spec.required {
      return Err(InputError::MissingRequiredInput(name.clone()));
    }
  }

  for name in supplied.keys().filter(|k| !declared.contains_key(*k)) {
    warn!(input = %name, "ignoring undeclared input");
  }

  Ok(resolved)
}
