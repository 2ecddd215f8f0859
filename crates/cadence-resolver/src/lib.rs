mod error;
mod inputs;
mod resolver;

pub use error::{InputError, ResolveError};
pub use inputs::resolve_inputs;
pub use resolver::{COMPOSITE, Resolver, StandardResolver};
