//! Loader mapping each namespace to a subdirectory of a base path.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::CollectionLoader;
use crate::collection::Collection;
use crate::constants::NAMESPACE_ENV_PREFIX;
use crate::error::LoadError;
use crate::provider::directory::contained;
use crate::provider::{DirectoryProvider, EnvProvider, Provider};

/// Serves namespace `name` from `base/name` (or `base/<alias>`).
///
/// The collection consults `NS_<NAME>_*` environment variables first, then
/// the JSON, YAML and TOML files of the directory.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    base: PathBuf,
    aliases: HashMap<String, String>,
    read_only: bool,
}

impl DirectoryLoader {
    pub fn new(base: impl Into<PathBuf>, read_only: bool) -> Self {
        Self {
            base: base.into(),
            aliases: HashMap::new(),
            read_only,
        }
    }

    /// Serve `namespace` from `base/directory` instead of `base/namespace`.
    pub fn with_alias(
        mut self,
        namespace: impl Into<String>,
        directory: impl Into<String>,
    ) -> Self {
        self.aliases.insert(namespace.into(), directory.into());
        self
    }

    pub fn with_aliases<I, K, V>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.aliases
            .extend(aliases.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

impl CollectionLoader for DirectoryLoader {
    fn load(&self, namespace: &str) -> Result<Option<Arc<Collection>>, LoadError> {
        let name = self
            .aliases
            .get(namespace)
            .map(String::as_str)
            .unwrap_or(namespace);
        let relative = contained(name).ok_or_else(|| LoadError::InvalidName {
            name: name.to_string(),
        })?;
        let dir = self.base.join(relative);

        let metadata = fs::metadata(&dir).map_err(|source| LoadError::Io {
            path: dir.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(LoadError::NotADirectory { path: dir });
        }

        let env = EnvProvider::new()
            .with_prefix(format!("{NAMESPACE_ENV_PREFIX}{}", name.to_uppercase()));
        let files = DirectoryProvider::with_default_codecs(&dir, self.read_only);

        let collection = Collection::temporary();
        collection.add_providers([
            Arc::new(env) as Arc<dyn Provider>,
            Arc::new(files) as Arc<dyn Provider>,
        ]);

        tracing::debug!(
            namespace = %namespace,
            path = %dir.display(),
            "loaded namespace from directory"
        );
        Ok(Some(Arc::new(collection)))
    }
}
