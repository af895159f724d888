//! `get`: print a resolved value.

use anyhow::{Context, Result};
use layered_config::Store;

pub fn run(store: &Store, namespace: &str, key: &str) -> Result<()> {
    let value = store
        .config(namespace)?
        .get(key)
        .with_context(|| format!("Failed to read '{key}' from namespace '{namespace}'"))?;

    let document = match value {
        Some(value) => value
            .to_document()
            .context("Failed to convert value to JSON")?,
        None => serde_json::Value::Null,
    };
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
