//! CLI argument definitions and parsing.
//!
//! Responsibilities:
//! - Define the CLI structure using clap derive macros.
//! - Parse `NS=DIR` alias pairs.
//! - Resolve the default configuration root.
//!
//! Non-responsibilities:
//! - Does not build the store (see `context` module).
//! - Does not execute commands (see `commands` module).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "layered-config")]
#[command(about = "Inspect and edit layered configuration namespaces", long_about = None)]
#[command(version)]
#[command(
    after_help = "Examples:\n  layered-config get billing currency\n  layered-config --alias tenant-a=shared get tenant-a limits.cpu\n  layered-config set billing retries '3'\n  layered-config --database config.db check billing shipping\n"
)]
pub struct Cli {
    /// Directory holding one subdirectory per namespace
    #[arg(long, global = true, env = "LAYERED_CONFIG_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Serve namespace NS from directory DIR under the root (repeatable)
    #[arg(long = "alias", global = true, value_name = "NS=DIR", value_parser = parse_alias)]
    pub aliases: Vec<(String, String)>,

    /// SQLite database consulted for namespaces without a directory
    #[arg(long, global = true, env = "LAYERED_CONFIG_DATABASE", value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Refuse every write
    #[arg(long, global = true)]
    pub read_only: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved value of a key as JSON
    Get {
        /// Namespace to read from
        namespace: String,

        /// Dotted configuration key
        key: String,
    },

    /// Persist a JSON value under a key
    Set {
        /// Namespace to write to
        namespace: String,

        /// Dotted configuration key
        key: String,

        /// JSON document to store (e.g., '{"host": "db", "port": 5432}')
        value: String,
    },

    /// Report whether each namespace can be resolved
    Check {
        /// Namespaces to check
        #[arg(required = true)]
        namespaces: Vec<String>,
    },
}

fn parse_alias(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((namespace, dir)) if !namespace.is_empty() && !dir.is_empty() => {
            Ok((namespace.to_string(), dir.to_string()))
        }
        _ => Err(format!("expected NS=DIR, got '{raw}'")),
    }
}

/// Platform configuration directory for this tool.
pub fn default_root() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "layered-config")
        .map(|dirs| dirs.config_dir().to_path_buf())
}
