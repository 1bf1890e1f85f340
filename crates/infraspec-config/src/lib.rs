//! Infrastructure configuration models and environment-scoped resolution.
//!
//! This crate owns the document schema, the variable layers used for
//! placeholder substitution, the globals/account merge and the binding of
//! the merged mapping into typed records consumed by deployment code.

mod error;
mod loader;
mod model;
mod requirements;
mod variables;

/// Public error type returned by every resolution stage.
pub use error::{ConfigError, ConfigErrorKind};
/// Resolution pipeline and its stages.
pub use loader::*;
/// Typed configuration records.
pub use model::*;
/// Per-environment required variables.
pub use requirements::{DEFAULT_ENVIRONMENTS, RequirementTable};
/// Variable layers used for substitution.
pub use variables::{ENVIRONMENT_VARIABLE, VariableLayer, VariableSource};
