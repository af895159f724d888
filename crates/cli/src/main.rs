//! layered-config - Command-line front end for the layered configuration store.
//!
//! Responsibilities:
//! - Load `.env` (unless disabled) and parse command-line arguments.
//! - Initialize logging from `RUST_LOG`.
//! - Build the store and run the selected command.
//!
//! Does NOT handle:
//! - Resolution or persistence logic (see `crates/config`).
//!
//! Invariants:
//! - `.env` is loaded BEFORE CLI parsing so clap env defaults can read its values.
//! - `DOTENV_DISABLED=1` or `DOTENV_DISABLED=true` skips `.env` entirely.
//! - Logs go to stderr; stdout carries only command output.

mod args;
mod commands;
mod context;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn dotenv_disabled() -> bool {
    matches!(
        std::env::var("DOTENV_DISABLED").ok().as_deref(),
        Some("1") | Some("true")
    )
}

fn load_dotenv() -> Result<()> {
    if dotenv_disabled() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn run(cli: Cli) -> Result<()> {
    let store = context::build_store(&cli)?;
    match &cli.command {
        Commands::Get { namespace, key } => commands::get::run(&store, namespace, key),
        Commands::Set {
            namespace,
            key,
            value,
        } => commands::set::run(&store, cli.read_only, namespace, key, value),
        Commands::Check { namespaces } => commands::check::run(&store, namespaces),
    }
}

fn main() {
    // Load .env file BEFORE CLI parsing so clap env defaults can read .env values
    if let Err(e) = load_dotenv() {
        eprintln!("Failed to load environment: {:#}", e);
        std::process::exit(1);
    }

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
