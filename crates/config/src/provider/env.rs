//! Environment variable provider.
//!
//! Responsibilities:
//! - Snapshot the process environment on first use.
//! - Map a dotted key to a variable-name prefix (`PREFIX_KEY`) and decode
//!   records from the variables below it.
//!
//! Does NOT handle:
//! - Persistence; the environment is read-only.
//! - `.env` files (loaded by the binary before the store is built).
//!
//! Invariants:
//! - All lookups between two `reset` calls see the same snapshot.
//! - `has` is a plain name-prefix test with no segment boundary: prefix
//!   `CONFIG` and key `a` match `CONFIG_AB` as well as `CONFIG_A_B`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Provider;
use crate::constants::DEFAULT_ENV_SEPARATOR;
use crate::error::DecodeError;
use crate::schema::AnyValue;
use crate::structure::StructDecoder;

type Snapshot = Arc<HashMap<String, String>>;

/// Reads configuration from environment variables.
#[derive(Debug)]
pub struct EnvProvider {
    prefix: String,
    separator: String,
    strict: bool,
    variables: RwLock<Option<Snapshot>>,
}

impl Default for EnvProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvProvider {
    /// A provider with no prefix and `_` as separator.
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
            separator: DEFAULT_ENV_SEPARATOR.to_string(),
            strict: false,
            variables: RwLock::new(None),
        }
    }

    /// A provider over a fixed set of variables instead of the process environment.
    ///
    /// `reset` discards the given variables and falls back to the process
    /// environment on the next lookup.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let snapshot = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<HashMap<_, _>>();
        Self {
            variables: RwLock::new(Some(Arc::new(snapshot))),
            ..Self::new()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Fail on unsupported field shapes instead of skipping them.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Drop the snapshot; the next lookup re-reads the process environment.
    pub fn reset(&self) {
        *self.variables.write() = None;
    }

    /// Variable name (or name prefix, for records) that holds `key`.
    pub fn variable_name(&self, key: &str) -> String {
        let key = key.to_uppercase();
        if self.prefix.is_empty() {
            key
        } else {
            format!("{}{}{}", self.prefix, self.separator, key)
        }
    }

    fn snapshot(&self) -> Snapshot {
        if let Some(snapshot) = self.variables.read().as_ref() {
            return Arc::clone(snapshot);
        }

        let mut guard = self.variables.write();
        let snapshot = guard.get_or_insert_with(|| {
            let vars = std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect::<HashMap<_, _>>();
            tracing::debug!(count = vars.len(), "captured environment snapshot");
            Arc::new(vars)
        });
        Arc::clone(snapshot)
    }
}

impl Provider for EnvProvider {
    fn has(&self, key: &str) -> bool {
        let name = self.variable_name(key);
        self.snapshot().keys().any(|k| k.starts_with(&name))
    }

    fn decode(&self, key: &str, target: &mut dyn AnyValue) -> Result<(), DecodeError> {
        let vars = self.snapshot();
        StructDecoder::new()
            .with_lookup(move |name| vars.get(name).cloned())
            .with_prefix(self.variable_name(key))
            .with_separator(self.separator.clone())
            .with_strict(self.strict)
            .decode(target.structure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use serial_test::serial;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Server {
        host: String,
        port: u16,
        debug: bool,
    }

    crate::record!(Server { host, port, debug });

    fn env_lock() -> &'static std::sync::Mutex<()> {
        crate::test_util::global_test_lock()
    }

    #[test]
    fn test_variable_name_with_and_without_prefix() {
        let bare = EnvProvider::new();
        assert_eq!(bare.variable_name("db.main"), "DB.MAIN");

        let prefixed = EnvProvider::new().with_prefix("APP");
        assert_eq!(prefixed.variable_name("db.main"), "APP_DB.MAIN");

        let dashed = EnvProvider::new().with_prefix("APP").with_separator("__");
        assert_eq!(dashed.variable_name("x"), "APP__X");
    }

    #[test]
    fn test_has_is_a_raw_prefix_match() {
        let provider = EnvProvider::from_vars([("CONFIG_SERVERX", "1")]).with_prefix("CONFIG");
        assert!(provider.has("server"));
        assert!(!provider.has("client"));
    }

    #[test]
    fn test_decode_record_from_fixed_vars() {
        let provider = EnvProvider::from_vars([
            ("CONFIG_WEB.1_HOST", "example.com"),
            ("CONFIG_WEB.1_PORT", "8443"),
            ("CONFIG_WEB.1_DEBUG", "true"),
        ])
        .with_prefix("CONFIG");

        let mut value: Box<dyn AnyValue> = Box::new(Server::default());
        provider.decode("web.1", value.as_mut()).unwrap();

        assert_eq!(
            value.downcast_ref::<Server>(),
            Some(&Server {
                host: "example.com".to_string(),
                port: 8443,
                debug: true,
            })
        );
    }

    #[test]
    fn test_decode_reports_malformed_values() {
        let provider = EnvProvider::from_vars([("WEB_PORT", "http")]);
        let mut value: Box<dyn AnyValue> = Box::new(Server::default());
        let err = provider.decode("web", value.as_mut()).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { ref key, .. } if key == "WEB_PORT"));
    }

    #[test]
    fn test_env_provider_is_never_writable() {
        assert!(EnvProvider::new().writer().is_none());
    }

    #[test]
    #[serial]
    fn test_snapshot_is_taken_once_until_reset() {
        let _lock = env_lock().lock().unwrap();
        let provider = EnvProvider::new().with_prefix("LCFG_SNAPSHOT");

        temp_env::with_vars([("LCFG_SNAPSHOT_SVC_HOST", Some("first"))], || {
            assert!(provider.has("svc"));
        });

        // The variable is gone from the process, but the snapshot still has it.
        temp_env::with_vars([("LCFG_SNAPSHOT_SVC_HOST", None::<&str>)], || {
            assert!(provider.has("svc"));

            provider.reset();
            assert!(!provider.has("svc"));
        });
    }

    #[test]
    #[serial]
    fn test_decode_reads_process_environment() {
        let _lock = env_lock().lock().unwrap();

        temp_env::with_vars(
            [
                ("LCFG_DECODE_API_HOST", Some("localhost")),
                ("LCFG_DECODE_API_PORT", Some("0x1F90")),
            ],
            || {
                let provider = EnvProvider::new().with_prefix("LCFG_DECODE");
                let mut value: Box<dyn AnyValue> = Box::new(Server::default());
                provider.decode("api", value.as_mut()).unwrap();

                let server = value.downcast_ref::<Server>().unwrap();
                assert_eq!(server.host, "localhost");
                assert_eq!(server.port, 8080);
                assert!(!server.debug);
            },
        );
    }
}
