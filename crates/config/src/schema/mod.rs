//! Schema registration: which value type a configuration key decodes into.
//!
//! Responsibilities:
//! - Bind key patterns (`service.*.limits`) to `ValueType` descriptors.
//! - Reject conflicting registrations with `SchemaConflict`.
//! - Resolve concrete keys to their descriptor.
//!
//! Does NOT handle:
//! - Locking; the store guards its registry with its own lock.
//! - Decoding values (see `collection` and `provider`).
//!
//! Invariants:
//! - A pattern is bound to at most one type for the registry's lifetime.
//! - Re-registering a pattern with the same type is a no-op.

pub mod matcher;
pub mod value;

pub use matcher::Matcher;
pub use value::{AnyValue, ConfigValue, ValueType};

use crate::constants::KEY_SEPARATOR;
use crate::error::SchemaConflict;

/// A component that declares the configuration keys it reads.
pub trait SchemaSource {
    fn config_schema(&self) -> Vec<(String, ValueType)>;
}

/// Pattern → value type table.
#[derive(Debug)]
pub struct SchemaRegistry {
    matcher: Matcher<ValueType>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(KEY_SEPARATOR),
        }
    }

    /// Builder-style registration of `T` under `pattern`.
    pub fn with<T: ConfigValue>(mut self, pattern: &str) -> Result<Self, SchemaConflict> {
        self.register(pattern, ValueType::of::<T>())?;
        Ok(self)
    }

    /// Bind `value_type` to `pattern`.
    pub fn register(&mut self, pattern: &str, value_type: ValueType) -> Result<(), SchemaConflict> {
        match self.matcher.get_pattern(pattern) {
            Some(existing) if *existing == value_type => Ok(()),
            Some(existing) => Err(SchemaConflict {
                pattern: pattern.to_string(),
                existing: existing.name(),
                requested: value_type.name(),
            }),
            None => {
                self.matcher.set(pattern, value_type);
                Ok(())
            }
        }
    }

    /// Register everything `source` declares, stopping at the first conflict.
    pub fn register_from(&mut self, source: &dyn SchemaSource) -> Result<(), SchemaConflict> {
        for (pattern, value_type) in source.config_schema() {
            self.register(&pattern, value_type)?;
        }
        Ok(())
    }

    /// Descriptor for a concrete key.
    pub fn lookup(&self, key: &str) -> Option<ValueType> {
        self.matcher.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.matcher.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }
}
