//! Execution module - transaction building and submission

pub mod executor;

pub use executor::{ActionExecutor, ActionKind, InstructionSet};
