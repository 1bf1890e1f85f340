//! Parsing of document text into the raw mapping tree.

use crate::ConfigError;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Origin label used for document parse errors.
const DOCUMENT_ORIGIN: &str = "document";

/// Parsed configuration document: defaults plus named account overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    globals: Map<String, Value>,
    accounts: Vec<AccountEntry>,
}

/// One entry of the `accounts` sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountEntry {
    name: String,
    values: Map<String, Value>,
}

impl AccountEntry {
    /// Environment name of this entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full override mapping, including `name`.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl RawDocument {
    /// Parse YAML text and check the top-level structure.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_yaml::from_str::<Option<Value>>(text)
            .map_err(yaml_error)?
            .unwrap_or_else(|| Value::Object(Map::new()));
        Self::from_value(root)
    }

    fn from_value(root: Value) -> Result<Self, ConfigError> {
        let Value::Object(mut root) = root else {
            return Err(ConfigError::malformed(
                DOCUMENT_ORIGIN,
                "expected a mapping at the document root",
            ));
        };

        let globals = match root.remove("globals") {
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(ConfigError::malformed(
                    DOCUMENT_ORIGIN,
                    "`globals` must be a mapping",
                ));
            }
            None => {
                return Err(ConfigError::malformed(
                    DOCUMENT_ORIGIN,
                    "missing top-level `globals` mapping",
                ));
            }
        };

        let entries = match root.remove("accounts") {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(ConfigError::malformed(
                    DOCUMENT_ORIGIN,
                    "`accounts` must be a sequence",
                ));
            }
            None => {
                return Err(ConfigError::malformed(
                    DOCUMENT_ORIGIN,
                    "missing top-level `accounts` sequence",
                ));
            }
        };

        let mut seen = HashSet::new();
        let mut accounts = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.into_iter().enumerate() {
            let Value::Object(values) = entry else {
                return Err(ConfigError::malformed(
                    DOCUMENT_ORIGIN,
                    format!("accounts[{idx}] must be a mapping"),
                ));
            };
            let name = match values.get("name") {
                Some(Value::String(name)) => name.clone(),
                Some(_) => {
                    return Err(ConfigError::malformed(
                        DOCUMENT_ORIGIN,
                        format!("accounts[{idx}].name must be a string"),
                    ));
                }
                None => {
                    return Err(ConfigError::malformed(
                        DOCUMENT_ORIGIN,
                        format!("accounts[{idx}] is missing required field `name`"),
                    ));
                }
            };
            if !seen.insert(name.clone()) {
                return Err(ConfigError::malformed(
                    DOCUMENT_ORIGIN,
                    format!("duplicate account name `{name}` at accounts[{idx}]"),
                ));
            }
            accounts.push(AccountEntry { name, values });
        }

        Ok(Self { globals, accounts })
    }

    /// Global defaults applied to every environment.
    pub fn globals(&self) -> &Map<String, Value> {
        &self.globals
    }

    /// Account entries in document order.
    pub fn accounts(&self) -> &[AccountEntry] {
        &self.accounts
    }

    /// Environment names in document order.
    pub fn environment_names(&self) -> Vec<String> {
        self.accounts.iter().map(|entry| entry.name.clone()).collect()
    }

    /// Look up an account entry by environment name.
    pub fn account(&self, name: &str) -> Result<&AccountEntry, ConfigError> {
        self.accounts
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| ConfigError::UnknownEnvironmentName {
                name: name.to_string(),
                known: self.environment_names(),
            })
    }
}

fn yaml_error(err: serde_yaml::Error) -> ConfigError {
    let location = err.location();
    ConfigError::MalformedDocument {
        origin: DOCUMENT_ORIGIN.to_string(),
        message: err.to_string(),
        line: location.as_ref().map(|loc| loc.line()),
        column: location.as_ref().map(|loc| loc.column()),
    }
}
