use std::collections::HashSet;
use std::time::Duration;

use indexmap::IndexMap;

use cadence_action::{Action, ActionReference, InputSpec, Shell, Step, StepKind};
use cadence_config::{ActionDef, DefaultsDef, StepDef};

use crate::error::ResolveError;

/// The only `runs.using` mode this crate can execute.
pub const COMPOSITE: &str = "composite";

/// Resolver transforms an ActionDef into a locked Action.
pub trait Resolver: Send + Sync {
  /// Resolve a definition into a locked action.
  ///
  /// This process:
  /// 1. Checks the execution mode
  /// 2. Validates every step's shape, shell, reference and timeout
  /// 3. Folds action-level defaults into each step
  fn resolve(&self, def: ActionDef) -> Result<Action, ResolveError>;
}

/// Standard resolver implementation.
#[derive(Debug, Clone, Default)]
pub struct StandardResolver;

impl StandardResolver {
  pub fn new() -> Self {
    Self
  }

  /// Display name for a step: its `name`, else something derived from what it runs.
  fn step_name(index: usize, def: &StepDef) -> String {
    if let Some(name) = &def.name {
      return name.clone();
    }
    if let Some(uses) = &def.uses {
      return format!("Run {}", uses);
    }
    if let Some(first) = def.run.as_deref().and_then(|r| r.lines().find(|l| !l.trim().is_empty())) {
      return format!("Run {}", first.trim());
    }
    def
      .id
      .clone()
      .unwrap_or_else(|| format!("step {}", index + 1))
  }

  fn resolve_shell(
    step: &str,
    explicit: Option<&str>,
    defaults: &DefaultsDef,
  ) -> Result<Option<Shell>, ResolveError> {
    explicit
      .or(defaults.shell.as_deref())
      .map(|s| {
        s.parse::<Shell>().map_err(|_| ResolveError::UnsupportedShell {
          step: step.to_string(),
          shell: s.to_string(),
        })
      })
      .transpose()
  }

  fn resolve_timeout(step: &str, def: &StepDef) -> Result<Option<Duration>, ResolveError> {
    match (def.timeout_minutes, def.timeout_ms) {
      (Some(_), Some(_)) => Err(ResolveError::InvalidStep {
        step: step.to_string(),
        message: "set only one of 'timeout-minutes' and 'timeout-ms'".to_string(),
      }),
      (Some(minutes), None) => {
        if minutes <= 0.0 {
          return Err(ResolveError::InvalidTimeout {
            step: step.to_string(),
          });
        }
        // Rejects NaN, infinity and values past `Duration::MAX`.
        Duration::try_from_secs_f64(minutes * 60.0)
          .map(Some)
          .map_err(|_| ResolveError::InvalidTimeout {
            step: step.to_string(),
          })
      }
      (None, Some(0)) => Err(ResolveError::InvalidTimeout {
        step: step.to_string(),
      }),
      (None, Some(ms)) => Ok(Some(Duration::from_millis(ms))),
      (None, None) => Ok(None),
    }
  }

  /// Resolve a single step definition into a locked step.
  fn resolve_step(
    &self,
    index: usize,
    def: StepDef,
    defaults: &DefaultsDef,
  ) -> Result<Step, ResolveError> {
    let name = Self::step_name(index, &def);
    let timeout = Self::resolve_timeout(&name, &def)?;

    let (kind, shell) = match (def.run, def.uses) {
      (Some(command), None) => {
        if def.pin.is_some() || def.version.is_some() || !def.with.is_empty() {
          return Err(ResolveError::InvalidStep {
            step: name,
            message: "'with', 'pin' and 'version' only apply to 'uses' steps".to_string(),
          });
        }
        let shell = Self::resolve_shell(&name, def.shell.as_deref(), defaults)?
          .ok_or_else(|| ResolveError::MissingShell { step: name.clone() })?;
        (StepKind::Run { command }, Some(shell))
      }
      (None, Some(uses)) => {
        let reference = ActionReference::parse(&uses)
          .and_then(|r| r.with_overrides(def.pin, def.version))
          .map_err(|source| ResolveError::InvalidReference {
            step: name.clone(),
            source,
          })?;
        let with: IndexMap<String, String> = def
          .with
          .into_iter()
          .map(|(k, v)| (k, v.into_string()))
          .collect();
        (StepKind::Uses { reference, with }, None)
      }
      (Some(_), Some(_)) => {
        return Err(ResolveError::InvalidStep {
          step: name,
          message: "a step cannot have both 'run' and 'uses'".to_string(),
        });
      }
      (None, None) => {
        return Err(ResolveError::InvalidStep {
          step: name,
          message: "a step needs either 'run' or 'uses'".to_string(),
        });
      }
    };

    Ok(Step {
      name,
      id: def.id,
      shell,
      working_directory: def
        .working_directory
        .or_else(|| defaults.working_directory.clone()),
      env: def
        .env
        .into_iter()
        .map(|(k, v)| (k, v.into_string()))
        .collect(),
      timeout,
      kind,
    })
  }
}

impl Resolver for StandardResolver {
  fn resolve(&self, def: ActionDef) -> Result<Action, ResolveError> {
    if def.runs.using != COMPOSITE {
      return Err(ResolveError::UnsupportedRunsMode {
        using: def.runs.using,
      });
    }

    let defaults = def.runs.defaults.unwrap_or_default();

    // A bad default shell is an error even if every step overrides it.
    if let Some(shell) = &defaults.shell {
      shell
        .parse::<Shell>()
        .map_err(|_| ResolveError::UnsupportedShell {
          step: "defaults".to_string(),
          shell: shell.clone(),
        })?;
    }

    let mut ids = HashSet::new();
    let mut steps = Vec::with_capacity(def.runs.steps.len());
    for (index, step_def) in def.runs.steps.into_iter().enumerate() {
      if let Some(id) = &step_def.id
        && !ids.insert(id.clone())
      {
        return Err(ResolveError::DuplicateStepId { id: id.clone() });
      }
      steps.push(self.resolve_step(index, step_def, &defaults)?);
    }

    let inputs = def
      .inputs
      .into_iter()
      .map(|(name, input)| {
        let spec = InputSpec {
          name: name.clone(),
          description: input.description,
          required: input.required,
          default: input.default.map(|d| d.into_string()),
        };
        (name, spec)
      })
      .collect();

    Ok(Action {
      name: def.name,
      description: def.description,
      inputs,
      steps,
    })
  }
}
