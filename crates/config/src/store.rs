//! Store: namespace table, schema table, and loader chain.
//!
//! Responsibilities:
//! - Resolve namespaces to collections, lazily through the loader chain.
//! - Look up the registered schema of a key and dispatch reads and writes to
//!   the namespace's collection.
//! - Hand out read-only and writable accessors bound to one namespace.
//!
//! Does NOT handle:
//! - Backend I/O (see `collection` and `provider`).
//! - Deciding what a missing key means; "no value" is returned as `None`.
//!
//! Invariants:
//! - The namespace and schema tables share one lock, held only for in-memory
//!   lookups and inserts, never across loader or provider calls.
//! - Loader errors are logged at warn level and never returned.
//! - A write whose value type differs from the registered schema never
//!   reaches a provider.
//! - Two threads racing on an unknown namespace may both run the loader
//!   chain; the later insert wins.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::collection::Collection;
use crate::error::{ConfigError, SchemaConflict};
use crate::loader::CollectionLoader;
use crate::schema::{AnyValue, ConfigValue, SchemaRegistry, SchemaSource, ValueType};

mod instance;

pub use instance::{Instance, Saver};

#[derive(Default)]
struct StoreState {
    namespaces: HashMap<String, Arc<Collection>>,
    schemas: SchemaRegistry,
}

/// Top-level configuration façade.
#[derive(Default)]
pub struct Store {
    state: RwLock<StoreState>,
    loaders: RwLock<Vec<Arc<dyn CollectionLoader>>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        let mut namespaces: Vec<_> = state.namespaces.keys().collect();
        namespaces.sort();
        f.debug_struct("Store")
            .field("namespaces", &namespaces)
            .field("schemas", &state.schemas.len())
            .field("loaders", &self.loaders.read().len())
            .finish()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// Register `collection` under `namespace`, replacing any previous entry.
    pub fn add_collection(&self, namespace: impl Into<String>, collection: Arc<Collection>) {
        self.state
            .write()
            .namespaces
            .insert(namespace.into(), collection);
    }

    /// Append loaders after the ones already registered.
    pub fn add_loaders<I>(&self, loaders: I)
    where
        I: IntoIterator<Item = Arc<dyn CollectionLoader>>,
    {
        self.loaders.write().extend(loaders);
    }

    /// Bind `value_type` to `pattern`.
    pub fn register_schema(
        &self,
        pattern: &str,
        value_type: ValueType,
    ) -> Result<(), SchemaConflict> {
        self.state.write().schemas.register(pattern, value_type)
    }

    /// Register every pattern a component declares.
    pub fn register_schemas_from(&self, source: &dyn SchemaSource) -> Result<(), SchemaConflict> {
        self.state.write().schemas.register_from(source)
    }

    /// Registered schema for a concrete key.
    pub fn schema_for(&self, key: &str) -> Option<ValueType> {
        self.state.read().schemas.lookup(key)
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.state.read().namespaces.contains_key(namespace)
    }

    /// Names in the namespace table, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.read().namespaces.keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop every namespace whose collection is temporary.
    pub fn remove_temporary(&self) {
        let mut state = self.state.write();
        let before = state.namespaces.len();
        state.namespaces.retain(|_, c| !c.is_temporary());
        tracing::debug!(
            removed = before - state.namespaces.len(),
            "removed temporary namespaces"
        );
    }

    /// Clear the cache of every registered collection.
    pub fn clear_all_caches(&self) {
        for collection in self.state.read().namespaces.values() {
            collection.clear_cache();
        }
    }

    /// Read-only accessor for `namespace`.
    pub fn config(&self, namespace: &str) -> Result<Instance<'_>, ConfigError> {
        self.instance(namespace, true)
    }

    /// Writable accessor for `namespace`.
    pub fn writable(&self, namespace: &str) -> Result<Instance<'_>, ConfigError> {
        self.instance(namespace, false)
    }

    fn instance(&self, namespace: &str, read_only: bool) -> Result<Instance<'_>, ConfigError> {
        self.collection(namespace)?;
        Ok(Instance::new(self, namespace, read_only))
    }

    /// Resolve `key` in `namespace`. `Ok(None)` means no provider holds it.
    pub fn get(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<Arc<dyn AnyValue>>, ConfigError> {
        let collection = self.collection(namespace)?;
        let value_type = self
            .schema_for(key)
            .ok_or_else(|| ConfigError::SchemaNotFound {
                key: key.to_string(),
            })?;
        collection.resolve(key, &value_type)
    }

    /// Typed variant of `get`.
    pub fn get_as<T: ConfigValue>(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<T>, ConfigError> {
        downcast_resolved(key, self.get(namespace, key)?)
    }

    /// Persist `value` under `key` in `namespace`.
    pub fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Arc<dyn AnyValue>,
    ) -> Result<(), ConfigError> {
        let collection = self.collection(namespace)?;
        let value_type = self.schema_for(key).ok_or_else(|| ConfigError::UnknownType {
            key: key.to_string(),
        })?;
        if !value_type.describes(value.as_ref()) {
            return Err(ConfigError::InvalidType {
                key: key.to_string(),
                expected: value_type.name(),
                found: value.type_name(),
            });
        }

        collection.persist(key, &value_type, value)?;
        tracing::debug!(namespace = %namespace, key = %key, "persisted configuration value");
        Ok(())
    }

    /// Typed variant of `set`.
    pub fn set_value<T: ConfigValue>(
        &self,
        namespace: &str,
        key: &str,
        value: T,
    ) -> Result<(), ConfigError> {
        self.set(namespace, key, Arc::new(value))
    }

    /// Collection for `namespace`, running the loader chain if it is unknown.
    fn collection(&self, namespace: &str) -> Result<Arc<Collection>, ConfigError> {
        if let Some(collection) = self.state.read().namespaces.get(namespace) {
            return Ok(Arc::clone(collection));
        }

        let loaders = self.loaders.read().clone();
        for loader in loaders {
            let loaded = match loader.load(namespace) {
                Ok(loaded) => loaded,
                Err(e) => {
                    tracing::warn!(namespace = %namespace, error = %e, "namespace load error");
                    continue;
                }
            };

            if let Some(collection) = loaded {
                tracing::debug!(
                    namespace = %namespace,
                    temporary = collection.is_temporary(),
                    "registered namespace from loader"
                );
                self.state
                    .write()
                    .namespaces
                    .insert(namespace.to_string(), Arc::clone(&collection));
                return Ok(collection);
            }
        }

        Err(ConfigError::CollectionNotFound {
            namespace: namespace.to_string(),
        })
    }
}

fn downcast_resolved<T: ConfigValue>(
    key: &str,
    value: Option<Arc<dyn AnyValue>>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|value| {
            value
                .downcast_ref::<T>()
                .cloned()
                .ok_or_else(|| ConfigError::InvalidType {
                    key: key.to_string(),
                    expected: std::any::type_name::<T>(),
                    found: value.type_name(),
                })
        })
        .transpose()
}

/// Collects schemas, loaders, and collections, validating schemas up front.
#[derive(Default)]
pub struct StoreBuilder {
    schemas: SchemaRegistry,
    loaders: Vec<Arc<dyn CollectionLoader>>,
    collections: Vec<(String, Arc<Collection>)>,
}

impl StoreBuilder {
    /// Register `T` under `pattern`; a conflicting type aborts the build.
    pub fn schema<T: ConfigValue>(mut self, pattern: &str) -> Result<Self, SchemaConflict> {
        self.schemas.register(pattern, ValueType::of::<T>())?;
        Ok(self)
    }

    pub fn schema_type(
        mut self,
        pattern: &str,
        value_type: ValueType,
    ) -> Result<Self, SchemaConflict> {
        self.schemas.register(pattern, value_type)?;
        Ok(self)
    }

    pub fn schemas_from(mut self, source: &dyn SchemaSource) -> Result<Self, SchemaConflict> {
        self.schemas.register_from(source)?;
        Ok(self)
    }

    pub fn loader(mut self, loader: impl CollectionLoader + 'static) -> Self {
        self.loaders.push(Arc::new(loader));
        self
    }

    pub fn collection(mut self, namespace: impl Into<String>, collection: Collection) -> Self {
        self.collections.push((namespace.into(), Arc::new(collection)));
        self
    }

    pub fn build(self) -> Store {
        Store {
            state: RwLock::new(StoreState {
                namespaces: self.collections.into_iter().collect(),
                schemas: self.schemas,
            }),
            loaders: RwLock::new(self.loaders),
        }
    }
}
