//! Store construction from command-line options.
//!
//! Responsibilities:
//! - Register the catch-all JSON schemas.
//! - Install the directory loader and, when requested, the database loader.
//!
//! Does NOT handle:
//! - Running commands (see `commands`).

use std::sync::Arc;

use anyhow::{Context, Result};
use layered_config::{DatabaseLoader, DirectoryLoader, SqliteConnection, Store};

use crate::args::{Cli, default_root};

/// Patterns for keys of one to four segments.
const CATCH_ALL_PATTERNS: [&str; 4] = ["*", "*.*", "*.*.*", "*.*.*.*"];

/// Build the store described by `cli`.
pub fn build_store(cli: &Cli) -> Result<Store> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => default_root().context("Unable to determine configuration directory")?,
    };
    tracing::debug!(root = %root.display(), read_only = cli.read_only, "building store");

    let mut builder = Store::builder();
    for pattern in CATCH_ALL_PATTERNS {
        builder = builder
            .schema::<serde_json::Value>(pattern)
            .with_context(|| format!("Failed to register schema {pattern}"))?;
    }

    let directories =
        DirectoryLoader::new(root, cli.read_only).with_aliases(cli.aliases.iter().cloned());
    builder = builder.loader(directories);

    if let Some(path) = &cli.database {
        let conn = SqliteConnection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        conn.create_schema()
            .with_context(|| format!("Failed to prepare database {}", path.display()))?;
        builder = builder.loader(DatabaseLoader::new(Arc::new(conn), cli.read_only));
    }

    Ok(builder.build())
}
