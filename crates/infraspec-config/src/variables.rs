//! Layered variable lookup used for placeholder substitution.
//!
//! Process variables always win over variables loaded from the optional
//! override file. A third built-in layer carries values the resolver
//! injects itself (such as the requested environment name) and loses to
//! both.

use crate::ConfigError;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Name of the built-in variable bound to the requested environment.
pub const ENVIRONMENT_VARIABLE: &str = "account";

/// Layer a resolved variable came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableLayer {
    /// Process environment snapshot.
    Process,
    /// Local override file.
    File,
    /// Values injected by the resolver.
    Builtin,
}

/// Snapshot of the variables visible to one resolution.
#[derive(Debug, Clone, Default)]
pub struct VariableSource {
    process: BTreeMap<String, String>,
    file: BTreeMap<String, String>,
    builtin: BTreeMap<String, String>,
}

impl VariableSource {
    /// Snapshot the current process environment with no file layer.
    pub fn from_process() -> Self {
        let process: BTreeMap<String, String> = std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        debug!("captured process variables (count={})", process.len());
        Self {
            process,
            ..Self::default()
        }
    }

    /// Build a source from explicit process and file layers.
    pub fn from_layers<P, F, K, V, FK, FV>(process: P, file: F) -> Self
    where
        P: IntoIterator<Item = (K, V)>,
        F: IntoIterator<Item = (FK, FV)>,
        K: Into<String>,
        V: Into<String>,
        FK: Into<String>,
        FV: Into<String>,
    {
        Self {
            process: collect_layer(process),
            file: collect_layer(file),
            builtin: BTreeMap::new(),
        }
    }

    /// Replace the file layer with the contents of an override file.
    ///
    /// A missing file leaves the layer empty; malformed lines are errors.
    pub fn with_variables_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("variables file missing (path={})", path.display());
                return Ok(self);
            }
            Err(err) => {
                return Err(ConfigError::ReadFailed {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        self.file = parse_variables_file(&contents, &path.display().to_string())?;
        debug!(
            "loaded variables file (path={}, count={})",
            path.display(),
            self.file.len()
        );
        Ok(self)
    }

    /// Add a built-in value, the lowest-precedence layer.
    pub fn with_builtin(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builtin.insert(name.into(), value.into());
        self
    }

    /// Look up a variable, honoring layer precedence.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.resolve_with_layer(name).map(|(value, _)| value)
    }

    /// Look up a variable and report which layer supplied it.
    pub fn resolve_with_layer(&self, name: &str) -> Option<(&str, VariableLayer)> {
        [
            (&self.process, VariableLayer::Process),
            (&self.file, VariableLayer::File),
            (&self.builtin, VariableLayer::Builtin),
        ]
        .into_iter()
        .find_map(|(layer, source)| layer.get(name).map(|value| (value.as_str(), source)))
    }

    /// True when the variable resolves to a non-empty value.
    pub fn is_set(&self, name: &str) -> bool {
        self.resolve(name).is_some_and(|value| !value.is_empty())
    }
}

fn collect_layer<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> BTreeMap<String, String>
where
    K: Into<String>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}

/// Parse `NAME=value` lines; blank lines and `#` comments are skipped.
///
/// Values are taken literally: `$NAME` and `${NAME}` are never expanded and
/// the process environment is never consulted.
pub(crate) fn parse_variables_file(
    contents: &str,
    origin: &str,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut vars = BTreeMap::new();
    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let malformed = |message: &str| ConfigError::MalformedDocument {
            origin: origin.to_string(),
            message: message.to_string(),
            line: Some(idx + 1),
            column: None,
        };
        let Some((name, value)) = line.split_once('=') else {
            return Err(malformed("expected NAME=value"));
        };
        let name = name.trim();
        if !is_variable_name(name) {
            return Err(malformed("invalid variable name"));
        }
        if vars
            .insert(name.to_string(), unquote(value.trim()).to_string())
            .is_some()
        {
            warn!("variable {name} defined more than once in {origin}; last value wins");
        }
    }
    Ok(vars)
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

pub(crate) fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}
