//! External action invocation for cadence.
//!
//! A `uses` step delegates to an external, versioned action. This crate
//! provides the [`ActionInvoker`] seam plus two implementations:
//!
//! - [`SetupRuntime`]: installs a language runtime from a local tool cache
//! - [`HostPassthrough`]: hands any other action to a host program
//!
//! [`Invokers`] routes a reference to the first invoker that handles it and
//! refuses references without a content pin before anything runs.

mod error;
mod host;
mod invoker;
pub mod process;
mod registry;
mod setup_runtime;

pub use error::InvokeError;
pub use host::{HostCommand, HostPassthrough};
pub use invoker::{ActionInvoker, InvokeOutput, InvokeRequest};
pub use registry::Invokers;
pub use setup_runtime::{RuntimeTool, SetupRuntime};
