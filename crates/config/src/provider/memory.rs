//! In-memory provider, mostly for tests and runtime overrides.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Persist, Provider};
use crate::error::{DecodeError, PersistError};
use crate::schema::AnyValue;

/// A key → value map that accepts every write.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    values: RwLock<HashMap<String, Arc<dyn AnyValue>>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl AnyValue) {
        self.values.write().insert(key.into(), Arc::new(value));
    }

    /// Drop every stored value.
    pub fn reset(&self) {
        self.values.write().clear();
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl Provider for MemoryProvider {
    fn has(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    fn decode(&self, key: &str, target: &mut dyn AnyValue) -> Result<(), DecodeError> {
        let stored = self
            .values
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| DecodeError::NotFound {
                key: key.to_string(),
            })?;
        target.assign_from(stored.as_ref())?;
        Ok(())
    }

    fn writer(&self) -> Option<&dyn Persist> {
        Some(self)
    }
}

impl Persist for MemoryProvider {
    fn can_persist(&self, _key: &str) -> bool {
        true
    }

    fn persist(&self, key: &str, value: &dyn AnyValue) -> Result<(), PersistError> {
        self.values
            .write()
            .insert(key.to_string(), Arc::from(value.clone_boxed()));
        Ok(())
    }
}
