//! Loader serving every namespace from the database `config` table.

use std::sync::Arc;

use super::CollectionLoader;
use crate::collection::Collection;
use crate::error::LoadError;
use crate::provider::{Connection, DatabaseProvider};

/// Accepts any namespace; rows that do not exist simply resolve to no value.
#[derive(Debug, Clone)]
pub struct DatabaseLoader {
    conn: Arc<dyn Connection>,
    read_only: bool,
}

impl DatabaseLoader {
    pub fn new(conn: Arc<dyn Connection>, read_only: bool) -> Self {
        Self { conn, read_only }
    }
}

impl CollectionLoader for DatabaseLoader {
    fn load(&self, namespace: &str) -> Result<Option<Arc<Collection>>, LoadError> {
        let provider = DatabaseProvider::new(Arc::clone(&self.conn), namespace, self.read_only);
        Ok(Some(Arc::new(Collection::temporary().with_provider(provider))))
    }
}
