//! Command-line interface for resolving environments.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use infraspec_config::{InfrastructureResolver, ResolverOptions, VariableSource};
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "infraspec")]
#[command(about = "Resolve environment-scoped infrastructure configuration", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve one environment and print it as JSON
    Resolve {
        /// Environment name as listed under `accounts`
        environment: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Print single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// List the environments declared by the document
    Environments {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Where to find the document and the variable override file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Path to the configuration document (default: configs/infrastructure.yaml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to a NAME=value override file (default: .env)
    #[arg(long, conflicts_with = "no_env_file")]
    pub env_file: Option<PathBuf>,

    /// Ignore any override file
    #[arg(long)]
    pub no_env_file: bool,
}

impl SourceArgs {
    /// Build resolver options relative to `base_dir`.
    pub fn options(&self, base_dir: &Path) -> ResolverOptions {
        let mut options = ResolverOptions::new(base_dir);
        if let Some(path) = self.config.as_ref() {
            options = options.with_document_path(path);
        }
        if self.no_env_file {
            options = options.without_variables_file();
        } else if let Some(path) = self.env_file.as_ref() {
            options = options.with_variables_file(path);
        }
        options
    }
}

/// Execute `cli` against `base_dir`, writing results to `out`.
pub fn run(
    cli: &Cli,
    base_dir: &Path,
    variables: VariableSource,
    out: &mut impl Write,
) -> Result<()> {
    match &cli.command {
        Commands::Resolve {
            environment,
            source,
            compact,
        } => {
            let resolver =
                InfrastructureResolver::with_variables(source.options(base_dir), variables)
                    .context("failed to load variables")?;
            let spec = resolver
                .get_infrastructure_info(environment)
                .with_context(|| format!("failed to resolve environment `{environment}`"))?;
            let rendered = if *compact {
                serde_json::to_string(&spec)
            } else {
                serde_json::to_string_pretty(&spec)
            }
            .context("failed to encode spec")?;
            writeln!(out, "{rendered}").context("failed to write output")?;
            info!("printed resolved spec (environment={environment}, compact={compact})");
        }
        Commands::Environments { source } => {
            let resolver =
                InfrastructureResolver::with_variables(source.options(base_dir), variables)
                    .context("failed to load variables")?;
            let names = resolver
                .environment_names()
                .context("failed to read environment names")?;
            debug!("listing environments (count={})", names.len());
            for name in names {
                writeln!(out, "{name}").context("failed to write output")?;
            }
        }
    }
    Ok(())
}
