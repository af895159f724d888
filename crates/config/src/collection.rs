//! Ordered provider chains with a per-key result cache.
//!
//! Responsibilities:
//! - Resolve a key by decoding it from every provider that holds it and
//!   overlaying the results in priority order (gap-filling merge).
//! - Persist a key through the first provider that accepts it.
//! - Cache resolved and persisted values, including "no value" results.
//!
//! Does NOT handle:
//! - Schema lookup; callers pass the `ValueType` to decode into.
//! - Namespace bookkeeping (see `store`).
//!
//! Invariants:
//! - Provider order is priority order; index 0 wins every conflict.
//! - The cache is empty right after the provider list changes.
//! - A failed resolution leaves the cache untouched.
//! - Backend I/O during resolution happens without holding the cache lock.
//! - Every cache invalidation or write bumps the generation under the cache
//!   write lock; a resolution only caches its result if the generation is
//!   the one it started from.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{ConfigError, PersistError};
use crate::provider::Provider;
use crate::schema::{AnyValue, ValueType};

type Cached = Option<Arc<dyn AnyValue>>;

/// An ordered list of providers plus a result cache.
#[derive(Debug, Default)]
pub struct Collection {
    providers: RwLock<Vec<Arc<dyn Provider>>>,
    cache: RwLock<HashMap<String, Cached>>,
    generation: AtomicU64,
    temporary: bool,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// A collection the store may evict with `remove_temporary`.
    pub fn temporary() -> Self {
        Self {
            temporary: true,
            ..Self::default()
        }
    }

    /// Builder-style variant of `add_providers` for a single provider.
    pub fn with_provider(self, provider: impl Provider + 'static) -> Self {
        self.add_providers([Arc::new(provider) as Arc<dyn Provider>]);
        self
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Append providers at the lowest priority and drop the cache.
    pub fn add_providers<I>(&self, providers: I)
    where
        I: IntoIterator<Item = Arc<dyn Provider>>,
    {
        self.providers.write().extend(providers);
        self.clear_cache();
    }

    pub fn provider_count(&self) -> usize {
        self.providers.read().len()
    }

    pub fn clear_cache(&self) {
        let mut cache = self.cache.write();
        cache.clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Keys that currently have a cache entry, sorted.
    pub fn cached_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.cache.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Resolve `key` as a `value_type`, consulting the cache first.
    ///
    /// Returns `Ok(None)` when no provider holds the key.
    pub fn resolve(
        &self,
        key: &str,
        value_type: &ValueType,
    ) -> Result<Option<Arc<dyn AnyValue>>, ConfigError> {
        let generation = {
            let cache = self.cache.read();
            if let Some(cached) = cache.get(key) {
                return Ok(cached.clone());
            }
            self.generation.load(Ordering::Acquire)
        };

        let resolved = self.find(key, value_type)?;

        let mut cache = self.cache.write();
        if self.generation.load(Ordering::Acquire) == generation {
            cache.insert(key.to_string(), resolved.clone());
        } else {
            tracing::debug!(key = %key, "cache changed during resolution, result not cached");
        }
        Ok(resolved)
    }

    fn find(&self, key: &str, value_type: &ValueType) -> Result<Cached, ConfigError> {
        let providers = self.providers.read().clone();
        let mut accumulator: Option<Box<dyn AnyValue>> = None;

        for provider in providers.iter().filter(|p| p.has(key)) {
            let mut current = value_type.fresh();
            provider
                .decode(key, current.as_mut())
                .map_err(|source| ConfigError::Decode {
                    key: key.to_string(),
                    source,
                })?;

            match accumulator.as_mut() {
                None => accumulator = Some(current),
                Some(upper) => {
                    upper
                        .merge_missing_any(current)
                        .map_err(|e| ConfigError::Decode {
                            key: key.to_string(),
                            source: e.into(),
                        })?
                }
            }
        }

        Ok(accumulator.map(Arc::from))
    }

    /// Persist `value` under `key` through the first provider that accepts it.
    pub fn persist(
        &self,
        key: &str,
        value_type: &ValueType,
        value: Arc<dyn AnyValue>,
    ) -> Result<(), ConfigError> {
        if !value_type.describes(value.as_ref()) {
            return Err(ConfigError::InvalidType {
                key: key.to_string(),
                expected: value_type.name(),
                found: value.type_name(),
            });
        }

        let providers = self.providers.read().clone();
        let mut cache = self.cache.write();

        let writer = providers
            .iter()
            .filter_map(|p| p.writer())
            .find(|w| w.can_persist(key))
            .ok_or_else(|| ConfigError::Persist {
                key: key.to_string(),
                source: PersistError::NoWritableProvider,
            })?;

        writer
            .persist(key, value.as_ref())
            .map_err(|source| ConfigError::Persist {
                key: key.to_string(),
                source,
            })?;

        cache.insert(key.to_string(), Some(value));
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
