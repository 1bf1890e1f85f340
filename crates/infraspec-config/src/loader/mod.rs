//! Environment-scoped resolution pipeline.
//!
//! Checks required variables, parses the document, selects the account
//! entry, substitutes placeholders, merges the account over the globals and
//! binds the result into an `InfrastructureSpec`.

mod document;
mod merge;
mod schema;
mod template;
mod utils;


pub use document::{AccountEntry, RawDocument};
pub use merge::merge_mappings;
pub use schema::{
    ACCESS, COMPUTE, ENDPOINTS, FieldKind, FieldSchema, LOGGING, NETWORK, REQUIRED_FIELDS,
    SectionSchema, WORKSTATION, bind_section, bind_spec, required_string,
};
pub use template::TemplateResolver;

use crate::variables::ENVIRONMENT_VARIABLE;
use crate::{ConfigError, InfrastructureSpec, RequirementTable, VariableSource};
use log::{debug, info};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Default document location relative to the base directory.
const DEFAULT_DOCUMENT_PATH: &str = "configs/infrastructure.yaml";
/// Default variable override file relative to the base directory.
const DEFAULT_VARIABLES_FILE: &str = ".env";

/// Where the configuration document comes from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// Read from disk on every resolution.
    Path(PathBuf),
    /// Held in memory.
    Inline(String),
}

/// Options controlling document and variable discovery.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Configuration document.
    pub document: DocumentSource,
    /// Optional `NAME=value` override file; a missing file is tolerated.
    pub variables_file: Option<PathBuf>,
    /// Required variables per environment.
    pub requirements: RequirementTable,
}

impl ResolverOptions {
    /// Create options with default locations under `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref();
        Self {
            document: DocumentSource::Path(base_dir.join(DEFAULT_DOCUMENT_PATH)),
            variables_file: Some(base_dir.join(DEFAULT_VARIABLES_FILE)),
            requirements: RequirementTable::default(),
        }
    }

    /// Create options over an in-memory document with no override file.
    pub fn inline(document: impl Into<String>) -> Self {
        Self {
            document: DocumentSource::Inline(document.into()),
            variables_file: None,
            requirements: RequirementTable::default(),
        }
    }

    /// Read the document from `path`.
    pub fn with_document_path(mut self, path: impl AsRef<Path>) -> Self {
        self.document = DocumentSource::Path(path.as_ref().to_path_buf());
        self
    }

    /// Load overrides from `path`.
    pub fn with_variables_file(mut self, path: impl AsRef<Path>) -> Self {
        self.variables_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Skip the override file entirely.
    pub fn without_variables_file(mut self) -> Self {
        self.variables_file = None;
        self
    }

    /// Replace the requirement table.
    pub fn with_requirements(mut self, requirements: RequirementTable) -> Self {
        self.requirements = requirements;
        self
    }
}

/// Stateless resolver over one document source and one variable snapshot.
#[derive(Debug, Clone)]
pub struct InfrastructureResolver {
    document: DocumentSource,
    variables: VariableSource,
    requirements: RequirementTable,
}

impl InfrastructureResolver {
    /// Snapshot the process environment and load the override file.
    pub fn new(options: ResolverOptions) -> Result<Self, ConfigError> {
        Self::with_variables(options, VariableSource::from_process())
    }

    /// Use an explicit process layer; the override file from `options` is
    /// still loaded into the file layer.
    pub fn with_variables(
        options: ResolverOptions,
        variables: VariableSource,
    ) -> Result<Self, ConfigError> {
        let variables = match options.variables_file.as_deref() {
            Some(path) => variables.with_variables_file(path)?,
            None => variables,
        };
        Ok(Self {
            document: options.document,
            variables,
            requirements: options.requirements,
        })
    }

    /// Resolve the typed spec for `environment`.
    ///
    /// Any failure stops the pipeline and is returned unchanged; no partial
    /// spec is produced.
    pub fn get_infrastructure_info(
        &self,
        environment: &str,
    ) -> Result<InfrastructureSpec, ConfigError> {
        self.assemble(environment)
    }

    /// Run every resolution stage for `environment`.
    pub fn assemble(&self, environment: &str) -> Result<InfrastructureSpec, ConfigError> {
        debug!("resolving infrastructure config (environment={environment})");
        self.requirements.validate(environment, &self.variables)?;

        let document = self.load_document()?;
        let merged = self.merged_mapping(&document, environment)?;
        let spec = schema::bind_spec(&merged)?;
        info!(
            "resolved infrastructure config (environment={}, region={})",
            spec.name, spec.region
        );
        Ok(spec)
    }

    /// Environment names declared by the document, in document order.
    pub fn environment_names(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.load_document()?.environment_names())
    }

    /// Parse the configuration document.
    pub fn load_document(&self) -> Result<RawDocument, ConfigError> {
        match &self.document {
            DocumentSource::Path(path) => {
                debug!("loading document (path={})", path.display());
                let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
                    path: path.clone(),
                    source,
                })?;
                RawDocument::parse(&text)
            }
            DocumentSource::Inline(text) => RawDocument::parse(text),
        }
    }

    /// Substitute and merge the globals with the selected account entry.
    fn merged_mapping(
        &self,
        document: &RawDocument,
        environment: &str,
    ) -> Result<Map<String, Value>, ConfigError> {
        let entry = document.account(environment)?;
        let variables = self
            .variables
            .clone()
            .with_builtin(ENVIRONMENT_VARIABLE, environment);
        let resolver = TemplateResolver::new(&variables);

        let globals = resolver.substitute_mapping(document.globals(), "globals")?;
        let account = resolver
            .substitute_mapping(entry.values(), &format!("accounts.{environment}"))?;
        let merged = merge::merge_mappings(&globals, &account)?;
        debug!(
            "merged globals with account overrides (environment={environment}, keys={})",
            merged.len()
        );
        Ok(merged)
    }
}

/// Resolve `environment` from the current directory and process environment.
pub fn get_infrastructure_info(environment: &str) -> Result<InfrastructureSpec, ConfigError> {
    let cwd = std::env::current_dir().map_err(|source| ConfigError::ReadFailed {
        path: PathBuf::from("."),
        source,
    })?;
    InfrastructureResolver::new(ResolverOptions::new(cwd))?.get_infrastructure_info(environment)
}
