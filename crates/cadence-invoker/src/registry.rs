use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::InvokeError;
use crate::host::HostPassthrough;
use crate::invoker::{ActionInvoker, InvokeOutput, InvokeRequest};

/// Routes action references to invokers.
///
/// Invokers are consulted in registration order; the fallback takes anything
/// none of them handle.
pub struct Invokers {
  invokers: Vec<Arc<dyn ActionInvoker>>,
  fallback: Arc<dyn ActionInvoker>,
}

impl Invokers {
  pub fn new(fallback: Arc<dyn ActionInvoker>) -> Self {
    Self {
      invokers: Vec::new(),
      fallback,
    }
  }

  /// Register an invoker ahead of the fallback.
  pub fn with(mut self, invoker: Arc<dyn ActionInvoker>) -> Self {
    self.invokers.push(invoker);
    self
  }

  fn select(&self, request: &InvokeRequest<'_>) -> &dyn ActionInvoker {
    self
      .invokers
      .iter()
      .find(|i| i.handles(request.reference))
      .map(|i| i.as_ref())
      .unwrap_or(self.fallback.as_ref())
  }

  /// Invoke the action named by `request.reference`.
  ///
  /// Fails with [`InvokeError::UnpinnedReference`] before any invoker runs if
  /// the reference lacks a content-addressed pin.
  pub async fn invoke(&self, request: InvokeRequest<'_>) -> Result<InvokeOutput, InvokeError> {
    if !request.reference.is_pinned() {
      warn!(action = %request.reference, "refusing unpinned action reference");
      return Err(InvokeError::UnpinnedReference {
        reference: request.reference.to_string(),
      });
    }

    debug!(action = %request.reference, "invoking action");
    self.select(&request).invoke(request).await
  }
}

impl Default for Invokers {
  fn default() -> Self {
    Self::new(Arc::new(HostPassthrough::disabled()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::Path;
  use std::sync::atomic::{AtomicUsize, Ordering};

  use async_trait::async_trait;
  use cadence_action::ActionReference;
  use indexmap::IndexMap;

  const SHA: &str = "1a4442cacd436585916779262731d5b162bc6ec7";

  /// Counts calls and answers for one action name.
  struct CountingInvoker {
    name: &'static str,
    calls: AtomicUsize,
  }

  impl CountingInvoker {
    fn new(name: &'static str) -> Arc<Self> {
      Arc::new(Self {
        name,
        calls: AtomicUsize::new(0),
      })
    }
  }

  #[async_trait]
  impl ActionInvoker for CountingInvoker {
    fn handles(&self, reference: &ActionReference) -> bool {
      reference.name == self.name
    }

    async fn invoke(&self, _request: InvokeRequest<'_>) -> Result<InvokeOutput, InvokeError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(InvokeOutput::success(self.name))
    }
  }

  async fn invoke(invokers: &Invokers, uses: &str) -> Result<InvokeOutput, InvokeError> {
    let reference = ActionReference::parse(uses).unwrap();
    invokers
      .invoke(InvokeRequest {
        reference: &reference,
        inputs: &IndexMap::new(),
        working_directory: Path::new("."),
        env: &IndexMap::new(),
        path_additions: &[],
      })
      .await
  }

  #[tokio::test]
  async fn test_unpinned_reference_rejected_before_invoking() {
    let counting = CountingInvoker::new("actions/setup-node");
    let invokers = Invokers::new(counting.clone()).with(counting.clone());

    let result = invoke(&invokers, "actions/setup-node@v4").await;

    assert!(matches!(result, Err(InvokeError::UnpinnedReference { .. })));
    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_routes_to_matching_invoker() {
    let node = CountingInvoker::new("actions/setup-node");
    let fallback = CountingInvoker::new("fallback");
    let invokers = Invokers::new(fallback.clone()).with(node.clone());

    let output = invoke(&invokers, &format!("actions/setup-node@{SHA}"))
      .await
      .unwrap();
    assert_eq!(output.stdout, "actions/setup-node");

    let output = invoke(&invokers, &format!("actions/cache@{SHA}"))
      .await
      .unwrap();
    assert_eq!(output.stdout, "fallback");

    assert_eq!(node.calls.load(Ordering::SeqCst), 1);
    assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_default_has_no_handler() {
    let result = invoke(&Invokers::default(), &format!("actions/cache@{SHA}")).await;
    assert!(matches!(result, Err(InvokeError::NoHandler { .. })));
  }
}
