//! Cadence Config
//!
//! This crate contains the serializable action definition types for Cadence.
//! These types mirror a composite action file before it is validated and
//! resolved into an executable `Action`.
//!
//! Definitions can be loaded from:
//! - YAML files (`action.yml`, `action.yaml`, or any non-JSON extension)
//! - JSON files (`*.json`)
//!
//! Nothing here checks shells, step shapes or references; that happens in the
//! resolver, which turns these types into the locked representation.

mod action;
mod error;
mod input;
mod load;
mod scalar;
mod step;

pub use action::{ActionDef, DefaultsDef, RunsDef};
pub use error::ConfigError;
pub use input::InputDef;
pub use load::{from_json_str, from_path, from_yaml_str};
pub use scalar::Scalar;
pub use step::StepDef;
