//! Collection loaders: build a namespace's collection on first access.
//!
//! Responsibilities:
//! - Define the `CollectionLoader` contract the store walks for unknown namespaces.
//! - Provide loaders backed by a directory tree and by a database.
//!
//! Does NOT handle:
//! - Caching loaded collections (the store owns the namespace table).
//! - Logging failures; the store logs every `LoadError` it sees.
//!
//! Invariants:
//! - `Ok(None)` means "this loader declines"; the store moves on silently.
//! - Collections built by loaders are temporary, so `remove_temporary` forces
//!   a fresh load on the next access.

use std::sync::Arc;

use crate::collection::Collection;
use crate::error::LoadError;

mod database;
mod directory;

pub use database::DatabaseLoader;
pub use directory::DirectoryLoader;

/// Builds the collection for a namespace, or declines.
pub trait CollectionLoader: Send + Sync {
    fn load(&self, namespace: &str) -> Result<Option<Arc<Collection>>, LoadError>;
}

impl<F> CollectionLoader for F
where
    F: Fn(&str) -> Result<Option<Arc<Collection>>, LoadError> + Send + Sync,
{
    fn load(&self, namespace: &str) -> Result<Option<Arc<Collection>>, LoadError> {
        self(namespace)
    }
}
