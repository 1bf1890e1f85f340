//! `infraspec` binary: resolve and inspect infrastructure environments.

use anyhow::Context;
use clap::Parser;
use infraspec::cli::{self, Cli};
use infraspec::config::VariableSource;
use log::debug;
use std::io;

fn main() -> anyhow::Result<()> {
    infraspec::init_logging();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    debug!("starting infraspec (cwd={})", cwd.display());
    let stdout = io::stdout();
    cli::run(&cli, &cwd, VariableSource::from_process(), &mut stdout.lock())
}
