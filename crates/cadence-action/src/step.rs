use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::reference::ActionReference;

/// Interpreter used for inline commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
  Bash,
  Sh,
  Pwsh,
  #[serde(rename = "powershell")]
  PowerShell,
  Cmd,
  Python,
}

impl Shell {
  /// Shell used for a `run` step built without one: `pwsh` on Windows, `bash` elsewhere.
  pub fn platform_default() -> Self {
    if cfg!(windows) { Shell::Pwsh } else { Shell::Bash }
  }

  /// Program name looked up on `PATH`.
  pub fn program(&self) -> &'static str {
    match self {
      Shell::Bash => "bash",
      Shell::Sh => "sh",
      Shell::Pwsh => "pwsh",
      Shell::PowerShell => "powershell",
      Shell::Cmd => "cmd",
      Shell::Python => "python",
    }
  }

  /// Arguments that make the interpreter run `script` and exit with its status.
  ///
  /// For [`Shell::Cmd`] the script is wrapped in quotes that `/S` strips
  /// again, so the arguments must reach `cmd` unescaped; see
  /// [`Shell::verbatim_args`].
  pub fn args(&self, script: &str) -> Vec<String> {
    let flags: &[&str] = match self {
      Shell::Bash => &["--noprofile", "--norc", "-eo", "pipefail", "-c"],
      Shell::Sh => &["-e", "-c"],
      Shell::Pwsh | Shell::PowerShell => &["-NoLogo", "-NonInteractive", "-NoProfile", "-Command"],
      Shell::Cmd => &["/D", "/E:ON", "/V:OFF", "/S", "/C"],
      Shell::Python => &["-c"],
    };

    let script = match self {
      Shell::Cmd => format!("\"{}\"", script),
      _ => script.to_string(),
    };

    flags
      .iter()
      .map(|f| f.to_string())
      .chain(std::iter::once(script))
      .collect()
  }

  /// Whether `args` must be passed to the process without quoting or
  /// escaping. `cmd` does not understand the backslash escapes the standard
  /// Windows argument quoting produces.
  pub fn verbatim_args(&self) -> bool {
    matches!(self, Shell::Cmd)
  }
}

impl FromStr for Shell {
  type Err = ActionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "bash" => Ok(Shell::Bash),
      "sh" => Ok(Shell::Sh),
      "pwsh" => Ok(Shell::Pwsh),
      "powershell" => Ok(Shell::PowerShell),
      "cmd" => Ok(Shell::Cmd),
      "python" => Ok(Shell::Python),
      other => Err(ActionError::UnsupportedShell(other.to_string())),
    }
  }
}

impl fmt::Display for Shell {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.program())
  }
}

/// What a step does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
  /// Inline command text, handed to the step's shell after template expansion.
  Run { command: String },
  /// Call to an external, independently versioned action.
  Uses {
    reference: ActionReference,
    with: IndexMap<String, String>,
  },
}

/// A validated step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
  pub name: String,
  pub id: Option<String>,
  /// Only consulted for [`StepKind::Run`].
  pub shell: Option<Shell>,
  /// Template; relative paths resolve against the run's base directory.
  pub working_directory: Option<String>,
  pub env: IndexMap<String, String>,
  pub timeout: Option<Duration>,
  pub kind: StepKind,
}

impl Step {
  /// Construct an inline command step with no overrides.
  pub fn run(name: impl Into<String>, shell: Shell, command: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      id: None,
      shell: Some(shell),
      working_directory: None,
      env: IndexMap::new(),
      timeout: None,
      kind: StepKind::Run {
        command: command.into(),
      },
    }
  }

  /// Construct an action call step.
  pub fn uses(
    name: impl Into<String>,
    reference: ActionReference,
    with: IndexMap<String, String>,
  ) -> Self {
    Self {
      name: name.into(),
      id: None,
      shell: None,
      working_directory: None,
      env: IndexMap::new(),
      timeout: None,
      kind: StepKind::Uses { reference, with },
    }
  }

  pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
    self.working_directory = Some(dir.into());
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_known_shells() {
    assert_eq!("bash".parse::<Shell>(), Ok(Shell::Bash));
    assert_eq!("powershell".parse::<Shell>(), Ok(Shell::PowerShell));
    assert_eq!(" pwsh ".parse::<Shell>(), Ok(Shell::Pwsh));
  }

  #[test]
  fn test_reject_unknown_shell() {
    assert_eq!(
      "fish".parse::<Shell>(),
      Err(ActionError::UnsupportedShell("fish".to_string()))
    );
  }

  #[test]
  fn test_script_is_last_argument() {
    let args = Shell::Sh.args("echo hi");
    assert_eq!(args, vec!["-e", "-c", "echo hi"]);

    let args = Shell::Cmd.args("dir");
    assert_eq!(args.last().map(String::as_str), Some("\"dir\""));
  }

  #[test]
  fn test_cmd_script_is_passed_verbatim() {
    let script = r#"echo "hello world" > "out file.txt""#;

    let args = Shell::Cmd.args(script);

    assert!(Shell::Cmd.verbatim_args());
    assert!(!Shell::Bash.verbatim_args());
    assert_eq!(&args[..5], &["/D", "/E:ON", "/V:OFF", "/S", "/C"]);
    assert_eq!(args[5], format!("\"{}\"", script));
  }
}
