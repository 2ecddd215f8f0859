//! Runtime installation from a local tool cache.
//!
//! Runtimes are laid out the way hosted runners keep them:
//! ```text
//! {tool_cache}/
//! └── node/
//!     ├── 18.19.0/x64/bin/node
//!     └── 20.11.1/x64/bin/node
//! ```
//!
//! Installing a runtime means finding the best cached version for the
//! requested spec and reporting its directory so later steps get it on `PATH`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use cadence_action::ActionReference;

use crate::error::InvokeError;
use crate::invoker::{ActionInvoker, InvokeOutput, InvokeRequest};

/// A runtime the installer knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeTool {
  /// Action name, e.g. `actions/setup-node`.
  pub action: String,
  /// Directory name in the tool cache, e.g. `node`.
  pub tool: String,
  /// `with` key carrying the version spec, e.g. `node-version`.
  pub version_input: String,
}

impl RuntimeTool {
  pub fn new(action: &str, tool: &str, version_input: &str) -> Self {
    Self {
      action: action.to_string(),
      tool: tool.to_string(),
      version_input: version_input.to_string(),
    }
  }
}

/// Installs language runtimes from a tool cache directory.
pub struct SetupRuntime {
  tool_cache: PathBuf,
  arch: String,
  tools: Vec<RuntimeTool>,
}

impl SetupRuntime {
  /// Create an installer over `tool_cache` for the host architecture.
  pub fn new(tool_cache: impl Into<PathBuf>) -> Self {
    Self {
      tool_cache: tool_cache.into(),
      arch: host_arch().to_string(),
      tools: vec![
        RuntimeTool::new("actions/setup-node", "node", "node-version"),
        RuntimeTool::new("actions/setup-python", "python", "python-version"),
        RuntimeTool::new("actions/setup-go", "go", "go-version"),
        RuntimeTool::new("actions/setup-java", "java", "java-version"),
      ],
    }
  }

  /// Override the architecture directory name (`x64`, `arm64`, ...).
  pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
    self.arch = arch.into();
    self
  }

  /// Register an additional runtime.
  pub fn with_tool(mut self, tool: RuntimeTool) -> Self {
    self.tools.push(tool);
    self
  }

  pub fn tool_cache(&self) -> &Path {
    &self.tool_cache
  }

  fn tool_for(&self, reference: &ActionReference) -> Option<&RuntimeTool> {
    self
      .tools
      .iter()
      .find(|t| t.action.eq_ignore_ascii_case(&reference.name))
  }

  /// Find the highest cached version of `tool` matching `spec`.
  ///
  /// Returns the version string and its architecture directory.
  pub async fn find_cached(
    &self,
    tool: &str,
    spec: &str,
  ) -> Result<Option<(String, PathBuf)>, InvokeError> {
    let tool_dir = self.tool_cache.join(tool);
    if !fs::try_exists(&tool_dir).await? {
      return Ok(None);
    }

    let wanted = parse_spec(spec);
    let mut best: Option<(Vec<u64>, String, PathBuf)> = None;

    let mut entries = fs::read_dir(&tool_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
      let version = match entry.file_name().to_str() {
        Some(v) => v.to_string(),
        None => continue,
      };
      let Some(parts) = parse_version(&version) else {
        continue;
      };
      if !matches_spec(&parts, wanted.as_deref()) {
        continue;
      }

      let arch_dir = entry.path().join(&self.arch);
      if !fs::metadata(&arch_dir).await.is_ok_and(|m| m.is_dir()) {
        continue;
      }

      if best.as_ref().is_none_or(|(b, _, _)| parts > *b) {
        best = Some((parts, version, arch_dir));
      }
    }

    Ok(best.map(|(_, version, dir)| (version, dir)))
  }
}

#[async_trait]
impl ActionInvoker for SetupRuntime {
  fn handles(&self, reference: &ActionReference) -> bool {
    self.tool_for(reference).is_some()
  }

  async fn invoke(&self, request: InvokeRequest<'_>) -> Result<InvokeOutput, InvokeError> {
    let tool = self
      .tool_for(request.reference)
      .ok_or_else(|| InvokeError::NoHandler {
        reference: request.reference.to_string(),
      })?;

    let spec = request
      .inputs
      .get(&tool.version_input)
      .map(|s| s.trim())
      .filter(|s| !s.is_empty())
      .ok_or_else(|| InvokeError::MissingInput {
        reference: request.reference.to_string(),
        input: tool.version_input.clone(),
      })?;

    match self.find_cached(&tool.tool, spec).await? {
      Some((version, dir)) => {
        let bin = dir.join("bin");
        let path = if fs::metadata(&bin).await.is_ok_and(|m| m.is_dir()) {
          bin
        } else {
          dir
        };

        info!(
          tool = %tool.tool,
          requested = %spec,
          version = %version,
          path = %path.display(),
          "runtime found in tool cache"
        );

        Ok(InvokeOutput {
          exit_code: Some(0),
          stdout: format!(
            "Found {} {} in tool cache\nAdded {} to PATH\n",
            tool.tool,
            version,
            path.display()
          ),
          stderr: String::new(),
          path_additions: vec![path],
        })
      }
      None => Ok(InvokeOutput::failure(
        1,
        format!(
          "{} version '{}' ({}) not found in tool cache {}\n",
          tool.tool,
          spec,
          self.arch,
          self.tool_cache.display()
        ),
      )),
    }
  }
}

/// Tool cache architecture name for the host.
fn host_arch() -> &'static str {
  match std::env::consts::ARCH {
    "x86_64" => "x64",
    "x86" => "x86",
    "aarch64" => "arm64",
    "arm" => "arm",
    other => other,
  }
}

/// Parse `1.2.3` (optionally `v`-prefixed) into numeric components.
fn parse_version(version: &str) -> Option<Vec<u64>> {
  let version = version.strip_prefix('v').unwrap_or(version);
  version
    .split('.')
    .map(|p| p.parse::<u64>().ok())
    .collect()
}

/// Parse a version spec into the components a match must start with.
///
/// `None` means any version (`*`, `latest`, `x`).
fn parse_spec(spec: &str) -> Option<Vec<u64>> {
  let spec = spec.trim();
  let spec = spec.strip_prefix('v').unwrap_or(spec);
  let parts: Vec<&str> = spec
    .split('.')
    .take_while(|p| !matches!(*p, "x" | "X" | "*"))
    .collect();

  if parts.is_empty() || spec == "latest" {
    return None;
  }
  // An unparseable spec matches nothing rather than everything.
  Some(
    parts
      .iter()
      .map(|p| p.parse::<u64>().unwrap_or(u64::MAX))
      .collect(),
  )
}

fn matches_spec(version: &[u64], spec: Option<&[u64]>) -> bool {
  match spec {
    None => true,
    Some(prefix) => version.starts_with(prefix),
  }
}
