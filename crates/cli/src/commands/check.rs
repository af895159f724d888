//! `check`: report which namespaces resolve.

use anyhow::{Result, bail};
use layered_config::Store;

pub fn run(store: &Store, namespaces: &[String]) -> Result<()> {
    let mut missing = Vec::new();
    for namespace in namespaces {
        if store.config(namespace).is_ok() {
            println!("ok       {namespace}");
        } else {
            println!("missing  {namespace}");
            missing.push(namespace.as_str());
        }
    }

    if !missing.is_empty() {
        bail!("Unresolved namespaces: {}", missing.join(", "));
    }
    Ok(())
}
