//! Cadence Action
//!
//! This crate provides the "locked" action representation for Cadence.
//! A locked action is the validated form of a definition file, ready to run.
//!
//! Key differences from `cadence-config`:
//! - Shells are a closed enum instead of free text
//! - Every step is exactly one of an inline command or an action call
//! - Action references are parsed into name, tag and content pin
//! - Action-level defaults have been folded into each step

mod action;
mod error;
mod reference;
mod step;

pub use action::{Action, InputSpec};
pub use error::ActionError;
pub use reference::{ActionReference, is_content_pin};
pub use step::{Shell, Step, StepKind};
