//! Error types for infrastructure config resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while resolving an environment's infrastructure config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required variables are unset for the requested environment.
    #[error(
        "missing environment variables for `{environment}`: {}",
        .names.join(", ")
    )]
    MissingEnvironmentVariables {
        environment: String,
        names: Vec<String>,
    },
    /// A `${NAME}` marker could not be resolved from any variable layer.
    #[error(
        "unresolved placeholder `${{{name}}}` at {path} (unresolved: {})",
        .unresolved.join(", ")
    )]
    UnresolvedTemplatePlaceholder {
        name: String,
        path: String,
        unresolved: Vec<String>,
    },
    /// The document or the variable override file is structurally invalid.
    #[error("malformed {origin}{}: {message}", location_suffix(.line, .column))]
    MalformedDocument {
        origin: String,
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },
    /// The requested environment is not declared under `accounts`.
    #[error("unknown environment `{name}` (known: {})", .known.join(", "))]
    UnknownEnvironmentName { name: String, known: Vec<String> },
    /// A key is a mapping on one side of the merge and a value on the other.
    #[error("merge conflict at {path}: {message}")]
    MergeTypeConflict { path: String, message: String },
    /// A field value cannot be coerced to its declared type.
    #[error("invalid value at {path}: expected {expected}, found {actual}")]
    FieldTypeMismatch {
        path: String,
        expected: &'static str,
        actual: String,
    },
    /// A required field is absent after merging.
    #[error("missing required field: {path}")]
    MissingRequiredField { path: String },
    /// Reading the document from disk failed.
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Decoding a validated section into its typed record failed.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
}

/// Machine-distinguishable kind of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    MissingEnvironmentVariables,
    UnresolvedTemplatePlaceholder,
    MalformedDocument,
    UnknownEnvironmentName,
    MergeTypeConflict,
    FieldTypeMismatch,
    MissingRequiredField,
    ReadFailed,
    DecodeFailed,
}

impl ConfigError {
    /// Return the kind of this error.
    pub fn kind(&self) -> ConfigErrorKind {
        match self {
            Self::MissingEnvironmentVariables { .. } => {
                ConfigErrorKind::MissingEnvironmentVariables
            }
            Self::UnresolvedTemplatePlaceholder { .. } => {
                ConfigErrorKind::UnresolvedTemplatePlaceholder
            }
            Self::MalformedDocument { .. } => ConfigErrorKind::MalformedDocument,
            Self::UnknownEnvironmentName { .. } => ConfigErrorKind::UnknownEnvironmentName,
            Self::MergeTypeConflict { .. } => ConfigErrorKind::MergeTypeConflict,
            Self::FieldTypeMismatch { .. } => ConfigErrorKind::FieldTypeMismatch,
            Self::MissingRequiredField { .. } => ConfigErrorKind::MissingRequiredField,
            Self::ReadFailed { .. } => ConfigErrorKind::ReadFailed,
            Self::DecodeFailed(_) => ConfigErrorKind::DecodeFailed,
        }
    }

    /// Build a malformed-document error without position information.
    pub(crate) fn malformed(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            origin: origin.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }
}

fn location_suffix(line: &Option<usize>, column: &Option<usize>) -> String {
    match (*line, *column) {
        (Some(line), Some(column)) => format!(" at line {line}, column {column}"),
        (Some(line), None) => format!(" at line {line}"),
        _ => String::new(),
    }
}
