//! Declared section schemas and binding of merged mappings into typed records.

use super::utils::{index_path, join_path};
use crate::{
    AccessControlSettings, ComputeSettings, ConfigError, EndpointSettings, InfrastructureSpec,
    LoggingSettings, NetworkSettings, WorkstationSettings,
};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Semantic type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    OptionalString,
    Integer,
    Bool,
    StringList,
}

impl FieldKind {
    /// Human-readable type name used in mismatch errors.
    pub fn expected(self) -> &'static str {
        match self {
            FieldKind::String | FieldKind::OptionalString => "string",
            FieldKind::Integer => "non-negative integer",
            FieldKind::Bool => "boolean",
            FieldKind::StringList => "list of strings",
        }
    }
}

/// One declared field of a section.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub key: &'static str,
    pub kind: FieldKind,
}

/// Declared shape of one configuration section.
#[derive(Debug, Clone, Copy)]
pub struct SectionSchema {
    /// Key of the section in the merged mapping.
    pub name: &'static str,
    pub fields: &'static [FieldSchema],
}

const fn field(key: &'static str, kind: FieldKind) -> FieldSchema {
    FieldSchema { key, kind }
}

/// Top-level fields that have no default.
pub const REQUIRED_FIELDS: [&str; 3] = ["name", "account", "region"];

pub const NETWORK: SectionSchema = SectionSchema {
    name: "vpc",
    fields: &[
        field("cidr", FieldKind::String),
        field("max_azs", FieldKind::Integer),
        field("subnet_mask", FieldKind::Integer),
        field("nat_gateways", FieldKind::Integer),
        field("enable_dns_hostnames", FieldKind::Bool),
        field("enable_dns_support", FieldKind::Bool),
    ],
};

pub const COMPUTE: SectionSchema = SectionSchema {
    name: "ec2",
    fields: &[
        field("instance_type", FieldKind::String),
        field("ami_id", FieldKind::OptionalString),
        field("key_name", FieldKind::OptionalString),
    ],
};

pub const WORKSTATION: SectionSchema = SectionSchema {
    name: "workstation",
    fields: &[
        field("architecture", FieldKind::String),
        field("instance_class", FieldKind::String),
        field("instance_size", FieldKind::String),
        field("root_volume_size", FieldKind::Integer),
        field("root_volume_type", FieldKind::String),
        field("guacamole_port", FieldKind::Integer),
        field("vnc_port", FieldKind::Integer),
        field("install_docker", FieldKind::Bool),
        field("install_vscode", FieldKind::Bool),
        field("install_intellij", FieldKind::Bool),
    ],
};

pub const LOGGING: SectionSchema = SectionSchema {
    name: "logging",
    fields: &[
        field("level", FieldKind::String),
        field("retention_days", FieldKind::Integer),
        field("flow_logs_enabled", FieldKind::Bool),
        field("log_group_name", FieldKind::String),
    ],
};

pub const ENDPOINTS: SectionSchema = SectionSchema {
    name: "endpoints",
    fields: &[
        field("services", FieldKind::StringList),
        field("private_dns_enabled", FieldKind::Bool),
    ],
};

pub const ACCESS: SectionSchema = SectionSchema {
    name: "access",
    fields: &[
        field("allowed_cidrs", FieldKind::StringList),
        field("blocked_countries", FieldKind::StringList),
        field("enable_waf", FieldKind::Bool),
        field("domain_name", FieldKind::OptionalString),
    ],
};

/// Bind a merged mapping into the full typed spec.
pub fn bind_spec(merged: &Map<String, Value>) -> Result<InfrastructureSpec, ConfigError> {
    let [name, account, region] = REQUIRED_FIELDS;
    Ok(InfrastructureSpec {
        name: required_string(merged, name)?,
        account: required_string(merged, account)?,
        region: required_string(merged, region)?,
        vpc: bind_section::<NetworkSettings>(merged, &NETWORK)?,
        ec2: bind_section::<ComputeSettings>(merged, &COMPUTE)?,
        workstation: bind_section::<WorkstationSettings>(merged, &WORKSTATION)?,
        logging: bind_section::<LoggingSettings>(merged, &LOGGING)?,
        endpoints: bind_section::<EndpointSettings>(merged, &ENDPOINTS)?,
        access: bind_section::<AccessControlSettings>(merged, &ACCESS)?,
    })
}

/// Read a required top-level string field.
pub fn required_string(merged: &Map<String, Value>, key: &str) -> Result<String, ConfigError> {
    match merged.get(key) {
        None | Some(Value::Null) => Err(ConfigError::MissingRequiredField {
            path: key.to_string(),
        }),
        Some(Value::String(value)) if value.trim().is_empty() => {
            Err(ConfigError::MissingRequiredField {
                path: key.to_string(),
            })
        }
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(mismatch(key, FieldKind::String.expected(), other)),
    }
}

/// Coerce the declared fields of one section and decode the typed record.
///
/// Absent fields take the record's defaults; keys outside the schema are
/// ignored.
pub fn bind_section<T: DeserializeOwned>(
    merged: &Map<String, Value>,
    schema: &SectionSchema,
) -> Result<T, ConfigError> {
    let mut normalized = Map::new();
    match merged.get(schema.name) {
        None | Some(Value::Null) => {
            debug!("section {} absent; using defaults", schema.name);
        }
        Some(Value::Object(section)) => {
            for declared in schema.fields {
                let Some(value) = section.get(declared.key) else {
                    continue;
                };
                if value.is_null() {
                    continue;
                }
                let path = join_path(schema.name, declared.key);
                normalized.insert(declared.key.to_string(), coerce(value, declared.kind, &path)?);
            }
        }
        Some(other) => return Err(mismatch(schema.name, "mapping", other)),
    }
    Ok(serde_json::from_value(Value::Object(normalized))?)
}

/// Coerce a raw value into the JSON shape of its declared kind.
fn coerce(value: &Value, kind: FieldKind, path: &str) -> Result<Value, ConfigError> {
    match kind {
        FieldKind::String | FieldKind::OptionalString => expect_string(value, path),
        FieldKind::Integer => expect_u32(value, path),
        FieldKind::Bool => expect_bool(value, path),
        FieldKind::StringList => expect_string_list(value, path),
    }
}

fn expect_string(value: &Value, path: &str) -> Result<Value, ConfigError> {
    match value {
        Value::String(_) => Ok(value.clone()),
        _ => Err(mismatch(path, FieldKind::String.expected(), value)),
    }
}

/// Accepts integers and decimal strings such as a substituted `"3"`.
fn expect_u32(value: &Value, path: &str) -> Result<Value, ConfigError> {
    let parsed = match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed
        .map(Value::from)
        .ok_or_else(|| mismatch(path, FieldKind::Integer.expected(), value))
}

fn expect_bool(value: &Value, path: &str) -> Result<Value, ConfigError> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(text) if text.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(text) if text.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        _ => Err(mismatch(path, FieldKind::Bool.expected(), value)),
    }
}

/// Accepts a sequence of strings or one comma-separated string.
fn expect_string_list(value: &Value, path: &str) -> Result<Value, ConfigError> {
    match value {
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                if !item.is_string() {
                    return Err(mismatch(&index_path(path, idx), "string", item));
                }
            }
            Ok(value.clone())
        }
        Value::String(text) => Ok(Value::Array(
            text.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect(),
        )),
        _ => Err(mismatch(path, FieldKind::StringList.expected(), value)),
    }
}

/// Build a structured type-mismatch error.
fn mismatch(path: &str, expected: &'static str, actual: &Value) -> ConfigError {
    ConfigError::FieldTypeMismatch {
        path: path.to_string(),
        expected,
        actual: actual.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn absent_sections_bind_to_defaults() {
        let merged = object(json!({}));
        let vpc: NetworkSettings = bind_section(&merged, &NETWORK).expect("vpc");
        let workstation: WorkstationSettings =
            bind_section(&merged, &WORKSTATION).expect("workstation");
        let endpoints: EndpointSettings = bind_section(&merged, &ENDPOINTS).expect("endpoints");
        assert_eq!(vpc, NetworkSettings::default());
        assert_eq!(workstation, WorkstationSettings::default());
        assert_eq!(endpoints.services, vec!["ssm", "ssmmessages", "ec2messages"]);
    }

    #[test]
    fn coerces_templated_strings() {
        let merged = object(json!({
            "vpc": { "max_azs": "3", "enable_dns_support": "FALSE" },
            "access": { "blocked_countries": "RU, KP ,," }
        }));
        let vpc: NetworkSettings = bind_section(&merged, &NETWORK).expect("vpc");
        assert_eq!(vpc.max_azs, 3);
        assert!(!vpc.enable_dns_support);
        assert_eq!(vpc.cidr, "10.0.0.0/16");
        let access: AccessControlSettings = bind_section(&merged, &ACCESS).expect("access");
        assert_eq!(access.blocked_countries, vec!["RU", "KP"]);
    }

    #[test]
    fn mismatch_names_field_type_and_value() {
        let merged = object(json!({ "vpc": { "max_azs": "three" } }));
        let err = bind_section::<NetworkSettings>(&merged, &NETWORK).unwrap_err();
        match err {
            ConfigError::FieldTypeMismatch {
                path,
                expected,
                actual,
            } => {
                assert_eq!(path, "vpc.max_azs");
                assert_eq!(expected, "non-negative integer");
                assert_eq!(actual, "\"three\"");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_negative_and_oversized_integers() {
        for raw in [json!(-1), json!(4_294_967_296u64), json!(2.5)] {
            let merged = object(json!({ "workstation": { "vnc_port": raw } }));
            let err = bind_section::<WorkstationSettings>(&merged, &WORKSTATION).unwrap_err();
            assert!(err.to_string().contains("workstation.vnc_port"));
        }
    }

    #[test]
    fn strings_are_not_produced_from_numbers() {
        let merged = object(json!({ "ec2": { "ami_id": 42 } }));
        let err = bind_section::<ComputeSettings>(&merged, &COMPUTE).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value at ec2.ami_id: expected string, found 42"
        );
    }

    #[test]
    fn list_entries_must_be_strings() {
        let merged = object(json!({ "endpoints": { "services": ["ssm", 7] } }));
        let err = bind_section::<EndpointSettings>(&merged, &ENDPOINTS).unwrap_err();
        assert!(err.to_string().contains("endpoints.services[1]"));
    }

    #[test]
    fn section_must_be_a_mapping() {
        let merged = object(json!({ "logging": ["INFO"] }));
        let err = bind_section::<LoggingSettings>(&merged, &LOGGING).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value at logging: expected mapping, found [\"INFO\"]"
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let merged = object(json!({
            "logging": { "level": "DEBUG", "future_field": { "x": 1 } },
            "future_section": 5
        }));
        let logging: LoggingSettings = bind_section(&merged, &LOGGING).expect("logging");
        assert_eq!(logging.level, "DEBUG");
    }

    #[test]
    fn optional_strings_default_to_none() {
        let merged = object(json!({ "ec2": { "key_name": "ops" } }));
        let ec2: ComputeSettings = bind_section(&merged, &COMPUTE).expect("ec2");
        assert_eq!(ec2.key_name.as_deref(), Some("ops"));
        assert_eq!(ec2.ami_id, None);
        assert_eq!(ec2.instance_type, "t3.micro");
    }

    #[test]
    fn required_fields_are_enforced() {
        let merged = object(json!({ "name": "sandbox", "account": "123" }));
        let err = bind_spec(&merged).unwrap_err();
        match err {
            ConfigError::MissingRequiredField { path } => assert_eq!(path, "region"),
            other => panic!("unexpected error: {other}"),
        }

        let merged = object(json!({ "name": "sandbox", "account": "", "region": "eu-west-1" }));
        let err = bind_spec(&merged).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequiredField { path } if path == "account"));

        let merged = object(json!({ "name": "sandbox", "account": 123, "region": "eu-west-1" }));
        let err = bind_spec(&merged).unwrap_err();
        assert!(matches!(err, ConfigError::FieldTypeMismatch { .. }));
    }

    #[test]
    fn binds_full_spec() {
        let merged = object(json!({
            "name": "production",
            "account": "222222222222",
            "region": "us-east-1",
            "vpc": { "cidr": "10.1.0.0/16", "max_azs": 3 },
            "workstation": { "install_intellij": true }
        }));
        let spec = bind_spec(&merged).expect("spec");
        assert_eq!(spec.name, "production");
        assert_eq!(spec.vpc.cidr, "10.1.0.0/16");
        assert_eq!(spec.vpc.max_azs, 3);
        assert!(spec.workstation.install_intellij);
        assert_eq!(spec.logging, LoggingSettings::default());
    }
}
