//! Per-environment required variables, checked before any document work.

use crate::{ConfigError, VariableSource};
use log::debug;
use std::collections::BTreeMap;

/// Environments that require their account id and region by default.
pub const DEFAULT_ENVIRONMENTS: [&str; 3] = ["sandbox", "production", "development"];

/// Mapping from environment name to the variables it needs.
///
/// Names without an entry require nothing, so an undeclared environment is
/// reported by the document lookup rather than as missing variables.
#[derive(Debug, Clone)]
pub struct RequirementTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for RequirementTable {
    fn default() -> Self {
        DEFAULT_ENVIRONMENTS
            .into_iter()
            .fold(Self::empty(), Self::with_conventional)
    }
}

impl RequirementTable {
    /// Table with no requirements for any environment.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Declare the exact variable list for one environment.
    pub fn with_environment<I, S>(mut self, environment: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            environment.into(),
            names.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Require `<PREFIX>_ACCOUNT_ID` and `<PREFIX>_REGION` for `environment`.
    pub fn with_conventional(self, environment: &str) -> Self {
        let prefix = variable_prefix(environment);
        self.with_environment(
            environment,
            [format!("{prefix}_ACCOUNT_ID"), format!("{prefix}_REGION")],
        )
    }

    /// Variables required for `environment`, in declaration order.
    pub fn required_for(&self, environment: &str) -> &[String] {
        self.entries
            .get(environment)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check every required variable, failing once with all missing names.
    pub fn validate(
        &self,
        environment: &str,
        variables: &VariableSource,
    ) -> Result<(), ConfigError> {
        let required = self.required_for(environment);
        let missing: Vec<String> = required
            .iter()
            .filter(|name| !variables.is_set(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvironmentVariables {
                environment: environment.to_string(),
                names: missing,
            });
        }
        debug!(
            "required variables present (environment={environment}, count={})",
            required.len()
        );
        Ok(())
    }
}

/// Upper-cased environment name with non-alphanumerics mapped to `_`.
fn variable_prefix(environment: &str) -> String {
    environment
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
