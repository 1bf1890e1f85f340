//! `${NAME}` placeholder substitution.
//!
//! Substitution runs over string scalars of the parsed tree rather than the
//! raw text, so a substituted account id stays a string and keeps its
//! leading zeros.

use super::utils::{index_path, join_path};
use crate::{ConfigError, VariableSource};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// `${NAME}` markers, with `$${NAME}` as an escape for the literal text.
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\$?)\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid placeholder regex")
});

/// Origin label for keys that collide after substitution.
const DOCUMENT_ORIGIN: &str = "document";

/// Placeholder substitution bound to one variable snapshot.
pub struct TemplateResolver<'a> {
    variables: &'a VariableSource,
}

/// Outcome of substituting a single piece of text.
#[derive(Debug, PartialEq, Eq)]
enum Substituted {
    Text(String),
    Unresolved(Vec<String>),
}

impl<'a> TemplateResolver<'a> {
    /// Build a resolver over `variables`.
    pub fn new(variables: &'a VariableSource) -> Self {
        Self { variables }
    }

    /// Replace every placeholder in `text`.
    pub fn substitute(&self, text: &str) -> Result<String, ConfigError> {
        match self.substitute_text(text) {
            Substituted::Text(text) => Ok(text),
            Substituted::Unresolved(names) => Err(unresolved_error(names, "")),
        }
    }

    /// Substitute every string key and value of a tree, returning a new tree.
    ///
    /// Every unresolved name in the tree is collected before failing; the
    /// error points at the first offending key path. Two keys of one mapping
    /// that substitute to the same text are a malformed document.
    pub fn substitute_tree(&self, value: &Value, path: &str) -> Result<Value, ConfigError> {
        let mut unresolved = Unresolved::default();
        let value = self.walk(value, path, &mut unresolved)?;
        match unresolved.first_path {
            Some(first_path) => Err(unresolved_error(unresolved.names, &first_path)),
            None => Ok(value),
        }
    }

    /// Substitute every string key and value of a mapping.
    pub fn substitute_mapping(
        &self,
        map: &Map<String, Value>,
        path: &str,
    ) -> Result<Map<String, Value>, ConfigError> {
        let mut unresolved = Unresolved::default();
        let map = self.walk_map(map, path, &mut unresolved)?;
        match unresolved.first_path {
            Some(first_path) => Err(unresolved_error(unresolved.names, &first_path)),
            None => Ok(map),
        }
    }

    fn walk(
        &self,
        value: &Value,
        path: &str,
        unresolved: &mut Unresolved,
    ) -> Result<Value, ConfigError> {
        Ok(match value {
            Value::String(text) => match self.substitute_text(text) {
                Substituted::Text(text) => Value::String(text),
                Substituted::Unresolved(names) => {
                    unresolved.record(names, path);
                    value.clone()
                }
            },
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| self.walk(item, &index_path(path, idx), unresolved))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => Value::Object(self.walk_map(map, path, unresolved)?),
            other => other.clone(),
        })
    }

    fn walk_map(
        &self,
        map: &Map<String, Value>,
        path: &str,
        unresolved: &mut Unresolved,
    ) -> Result<Map<String, Value>, ConfigError> {
        let mut out = Map::with_capacity(map.len());
        for (raw_key, item) in map {
            let key = match self.substitute_text(raw_key) {
                Substituted::Text(key) => key,
                Substituted::Unresolved(names) => {
                    unresolved.record(names, &join_path(path, raw_key));
                    raw_key.clone()
                }
            };
            let child = join_path(path, &key);
            let value = self.walk(item, &child, unresolved)?;
            if out.insert(key, value).is_some() {
                return Err(ConfigError::malformed(
                    DOCUMENT_ORIGIN,
                    format!("key `{raw_key}` collides with another key at {child}"),
                ));
            }
        }
        Ok(out)
    }

    fn substitute_text(&self, text: &str) -> Substituted {
        let mut output = String::with_capacity(text.len());
        let mut missing: Vec<String> = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER_PATTERN.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            output.push_str(&text[last..whole.start()]);
            last = whole.end();
            let name = &caps[2];
            if is_escaped(&caps) {
                output.push_str("${");
                output.push_str(name);
                output.push('}');
                continue;
            }
            match self.variables.resolve(name) {
                Some(value) => output.push_str(value),
                None => {
                    if !missing.iter().any(|seen| seen == name) {
                        missing.push(name.to_string());
                    }
                }
            }
        }
        if !missing.is_empty() {
            return Substituted::Unresolved(missing);
        }
        output.push_str(&text[last..]);
        Substituted::Text(output)
    }
}

/// Unresolved names collected across a tree walk.
#[derive(Default)]
struct Unresolved {
    names: Vec<String>,
    first_path: Option<String>,
}

impl Unresolved {
    fn record(&mut self, names: Vec<String>, path: &str) {
        if self.first_path.is_none() {
            self.first_path = Some(path.to_string());
        }
        for name in names {
            if !self.names.contains(&name) {
                self.names.push(name);
            }
        }
    }
}

fn unresolved_error(names: Vec<String>, path: &str) -> ConfigError {
    ConfigError::UnresolvedTemplatePlaceholder {
        name: names.first().cloned().unwrap_or_default(),
        path: if path.is_empty() { "root" } else { path }.to_string(),
        unresolved: names,
    }
}

fn is_escaped(caps: &Captures<'_>) -> bool {
    caps.get(1).is_some_and(|dollar| !dollar.as_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn vars() -> VariableSource {
        VariableSource::from_layers(
            [("SANDBOX_ACCOUNT_ID", "011111111111"), ("REGION", "eu-west-1")],
            [("REGION", "us-east-1"), ("FILE_ONLY", "from-file")],
        )
    }

    #[test]
    fn replaces_markers_from_both_layers() {
        let vars = vars();
        let resolver = TemplateResolver::new(&vars);
        assert_eq!(resolver.substitute("${REGION}").expect("region"), "eu-west-1");
        assert_eq!(resolver.substitute("${FILE_ONLY}").expect("file"), "from-file");
    }

    #[test]
    fn replaces_several_markers_in_one_string() {
        let vars = vars();
        let resolver = TemplateResolver::new(&vars);
        let out = resolver
            .substitute("arn:aws:iam::${SANDBOX_ACCOUNT_ID}:root@${REGION}")
            .expect("substitute");
        assert_eq!(out, "arn:aws:iam::011111111111:root@eu-west-1");
    }

    #[test]
    fn escaped_marker_is_kept_literally() {
        let vars = vars();
        let resolver = TemplateResolver::new(&vars);
        assert_eq!(
            resolver.substitute("literal $${REGION}").expect("substitute"),
            "literal ${REGION}"
        );
    }

    #[test]
    fn substituted_account_id_stays_a_string() {
        let vars = vars();
        let resolver = TemplateResolver::new(&vars);
        let tree = json!({ "account": "${SANDBOX_ACCOUNT_ID}", "max_azs": 2 });
        let out = resolver.substitute_tree(&tree, "").expect("tree");
        assert_eq!(out, json!({ "account": "011111111111", "max_azs": 2 }));
    }

    #[test]
    fn unresolved_marker_in_tree_reports_path_and_all_names() {
        let vars = vars();
        let resolver = TemplateResolver::new(&vars);
        let tree = json!({
            "vpc": { "cidr": "${MISSING_VAR}" },
            "access": { "allowed_cidrs": ["${OTHER_MISSING}", "${MISSING_VAR}"] }
        });
        match resolver.substitute_tree(&tree, "globals").unwrap_err() {
            ConfigError::UnresolvedTemplatePlaceholder {
                name,
                path,
                unresolved,
            } => {
                assert_eq!(name, "OTHER_MISSING");
                assert_eq!(path, "globals.access.allowed_cidrs[0]");
                assert_eq!(unresolved, vec!["OTHER_MISSING", "MISSING_VAR"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn text_without_markers_is_unchanged() {
        let vars = vars();
        let resolver = TemplateResolver::new(&vars);
        assert_eq!(resolver.substitute("10.0.0.0/16").expect("plain"), "10.0.0.0/16");
    }

    #[test]
    fn keys_colliding_after_substitution_are_malformed() {
        let vars = vars().with_builtin("account", "sandbox");
        let resolver = TemplateResolver::new(&vars);
        let tree = json!({ "tags": { "${account}_x": "a", "sandbox_x": "b" } });
        let err = resolver.substitute_tree(&tree, "globals").unwrap_err();
        assert_eq!(err.kind(), crate::ConfigErrorKind::MalformedDocument);
        assert!(err.to_string().contains("globals.tags.sandbox_x"));
    }

    #[test]
    fn escaped_marker_in_value_is_not_a_lookup() {
        let vars = vars();
        let resolver = TemplateResolver::new(&vars);
        let tree = json!({ "script": "echo $${HOME}" });
        let out = resolver.substitute_tree(&tree, "").expect("tree");
        assert_eq!(out, json!({ "script": "echo ${HOME}" }));
    }
}
