//! `set`: persist a JSON document.

use anyhow::{Context, Result};
use layered_config::Store;

pub fn run(store: &Store, read_only: bool, namespace: &str, key: &str, raw: &str) -> Result<()> {
    let document: serde_json::Value =
        serde_json::from_str(raw).with_context(|| format!("Value for '{key}' is not valid JSON"))?;

    let instance = if read_only {
        store.config(namespace)?
    } else {
        store.writable(namespace)?
    };

    let (_, saver) = instance.get_writable(key)?;
    saver
        .save(document)
        .with_context(|| format!("Failed to save '{key}' in namespace '{namespace}'"))?;

    tracing::info!(namespace = %namespace, key = %key, "saved configuration value");
    Ok(())
}
