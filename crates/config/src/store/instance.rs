//! Namespace-bound accessors handed out by the store.

use std::sync::Arc;

use super::{Store, downcast_resolved};
use crate::error::ConfigError;
use crate::schema::{AnyValue, ConfigValue};

/// A read-only or writable view of one namespace.
#[derive(Debug, Clone)]
pub struct Instance<'s> {
    store: &'s Store,
    namespace: String,
    read_only: bool,
}

impl<'s> Instance<'s> {
    pub(super) fn new(store: &'s Store, namespace: &str, read_only: bool) -> Self {
        Self {
            store,
            namespace: namespace.to_string(),
            read_only,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn get(&self, key: &str) -> Result<Option<Arc<dyn AnyValue>>, ConfigError> {
        self.store.get(&self.namespace, key)
    }

    pub fn get_as<T: ConfigValue>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.store.get_as(&self.namespace, key)
    }

    /// Current value of `key` plus a saver bound to it.
    ///
    /// Fails on a read-only instance before any backend is consulted.
    pub fn get_writable(
        &self,
        key: &str,
    ) -> Result<(Option<Arc<dyn AnyValue>>, Saver<'s>), ConfigError> {
        if self.read_only {
            return Err(ConfigError::ReadOnly {
                namespace: self.namespace.clone(),
            });
        }

        let value = self.get(key)?;
        let saver = Saver {
            store: self.store,
            namespace: self.namespace.clone(),
            key: key.to_string(),
        };
        Ok((value, saver))
    }
}

/// Writes one key of one namespace back through the store.
#[derive(Debug, Clone)]
pub struct Saver<'s> {
    store: &'s Store,
    namespace: String,
    key: String,
}

impl Saver<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn save<T: ConfigValue>(&self, value: T) -> Result<(), ConfigError> {
        self.save_any(Arc::new(value))
    }

    pub fn save_any(&self, value: Arc<dyn AnyValue>) -> Result<(), ConfigError> {
        self.store.set(&self.namespace, &self.key, value)
    }
}
