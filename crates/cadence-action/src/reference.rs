//! External action references.
//!
//! A reference names an independently versioned unit of automation:
//!
//! ```text
//! actions/setup-node@1a4442cacd436585916779262731d5b162bc6ec7   # content pin
//! actions/setup-node@v4                                          # mutable tag
//! ```
//!
//! Only a content pin is immutable. A tag may be supplied next to it for
//! humans, but a tag on its own is never enough to invoke the action.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ActionError;

/// A parsed `uses` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReference {
  /// e.g. `actions/setup-node`
  pub name: String,
  /// Human-readable version such as `v4.0.2`.
  pub tag: Option<String>,
  /// Content identifier such as a full commit hash.
  pub pin: Option<String>,
}

impl ActionReference {
  /// Parse `name@ref`, sorting `ref` into pin or tag.
  pub fn parse(uses: &str) -> Result<Self, ActionError> {
    let invalid = |message: &str| ActionError::InvalidReference {
      reference: uses.to_string(),
      message: message.to_string(),
    };

    let (name, git_ref) = uses.trim().rsplit_once('@').ok_or_else(|| invalid("missing '@ref'"))?;

    if name.is_empty() {
      return Err(invalid("empty action name"));
    }
    if git_ref.is_empty() {
      return Err(invalid("empty ref after '@'"));
    }

    let (tag, pin) = if is_content_pin(git_ref) {
      (None, Some(git_ref.to_string()))
    } else {
      (Some(git_ref.to_string()), None)
    };

    Ok(Self {
      name: name.to_string(),
      tag,
      pin,
    })
  }

  /// Attach an explicit pin and/or tag declared beside `uses`.
  ///
  /// An explicit pin must itself be a content identifier.
  pub fn with_overrides(
    mut self,
    pin: Option<String>,
    tag: Option<String>,
  ) -> Result<Self, ActionError> {
    if let Some(pin) = pin {
      if !is_content_pin(&pin) {
        return Err(ActionError::InvalidReference {
          reference: self.to_string(),
          message: format!("pin '{}' is not a content hash", pin),
        });
      }
      self.pin = Some(pin);
    }
    if let Some(tag) = tag {
      self.tag = Some(tag);
    }
    Ok(self)
  }

  /// True when the reference carries an immutable content identifier.
  pub fn is_pinned(&self) -> bool {
    self.pin.as_deref().is_some_and(is_content_pin)
  }

  /// The ref the host platform should resolve: the pin if present, else the tag.
  pub fn git_ref(&self) -> Option<&str> {
    self.pin.as_deref().or(self.tag.as_deref())
  }
}

impl fmt::Display for ActionReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.git_ref() {
      Some(r) => write!(f, "{}@{}", self.name, r)?,
      None => f.write_str(&self.name)?,
    }
    if let (Some(_), Some(tag)) = (&self.pin, &self.tag) {
      write!(f, " ({})", tag)?;
    }
    Ok(())
  }
}

/// Whether `value` is a content-addressed identifier.
///
/// Accepts a full git SHA-1 (40 hex), a SHA-256 (64 hex), or `sha256:<64 hex>`.
pub fn is_content_pin(value: &str) -> bool {
  let hex = value.strip_prefix("sha256:").unwrap_or(value);
  let expected_len = if hex.len() == value.len() {
    hex.len() == 40 || hex.len() == 64
  } else {
    hex.len() == 64
  };
  expected_len && hex.bytes().all(|b| b.is_ascii_hexdigit())
}
