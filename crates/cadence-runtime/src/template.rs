//! Placeholder expansion.
//!
//! Step text may reference resolved inputs and environment variables:
//!
//! ```text
//! working-directory: ${{ inputs.working-directory }}
//! run: echo "home is ${{ env.HOME }}"
//! ```
//!
//! Expansion is plain text substitution. There are no operators, functions
//! or other contexts; anything else is an error.

use std::sync::LazyLock;

use regex::Regex;

use crate::context::ExecutionContext;
use crate::error::TemplateError;

static PLACEHOLDER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\$\{\{(.*?)\}\}").expect("placeholder regex is valid"));

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(inputs|env)\.([A-Za-z0-9_][A-Za-z0-9_.\-]*)$").expect("expression regex is valid")
});

/// Lookup used during expansion.
pub(crate) trait Scope {
  fn input(&self, name: &str) -> Option<&str>;
  fn env(&self, name: &str) -> Option<&str>;
}

impl Scope for ExecutionContext {
  fn input(&self, name: &str) -> Option<&str> {
    self.inputs.get(name).map(String::as_str)
  }

  fn env(&self, name: &str) -> Option<&str> {
    self.env.get(name).map(String::as_str)
  }
}

/// Expand every placeholder in `template` against the context.
pub fn expand(template: &str, ctx: &ExecutionContext) -> Result<String, TemplateError> {
  expand_in(template, ctx)
}

pub(crate) fn expand_in(template: &str, scope: &impl Scope) -> Result<String, TemplateError> {
  let mut out = String::with_capacity(template.len());
  let mut last = 0;

  for caps in PLACEHOLDER.captures_iter(template) {
    let whole = caps.get(0).expect("group 0 always matches");
    let literal = &template[last..whole.start()];
    if literal.contains("${{") {
      return Err(TemplateError::Unterminated {
        template: template.to_string(),
      });
    }
    out.push_str(literal);
    out.push_str(evaluate(caps[1].trim(), scope)?);
    last = whole.end();
  }

  let tail = &template[last..];
  if tail.contains("${{") {
    return Err(TemplateError::Unterminated {
      template: template.to_string(),
    });
  }
  out.push_str(tail);

  Ok(out)
}

fn evaluate<'s>(expression: &str, scope: &'s impl Scope) -> Result<&'s str, TemplateError> {
  let caps = EXPRESSION
    .captures(expression)
    .ok_or_else(|| TemplateError::Unsupported {
      expression: expression.to_string(),
    })?;

  let name = &caps[2];
  let value = match &caps[1] {
    "inputs" => scope.input(name),
    _ => scope.env(name),
  };

  value.ok_or_else(|| TemplateError::Unresolved {
    expression: expression.to_string(),
  })
}
