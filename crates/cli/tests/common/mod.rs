//! Shared test utilities for layered-config integration tests.
//!
//! Invariants / Assumptions:
//! - Every command is hermetic: `.env` loading is disabled and the root and
//!   database variables from the host are cleared.

use std::fs;
use std::path::Path;

use assert_cmd::Command;

/// Returns a hermetic `layered-config` command rooted at `root`.
pub fn cli_cmd(root: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("layered-config");
    cmd.env("DOTENV_DISABLED", "1")
        .env_remove("LAYERED_CONFIG_ROOT")
        .env_remove("LAYERED_CONFIG_DATABASE")
        .env_remove("RUST_LOG")
        .arg("--root")
        .arg(root);
    cmd
}

/// Write `content` to `root/namespace/file`, creating the namespace directory.
#[allow(dead_code)]
pub fn write_config(root: &Path, namespace: &str, file: &str, content: &str) {
    let dir = root.join(namespace);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), content).unwrap();
}
