//! Layered configuration resolution.
//!
//! A [`Store`] maps namespaces to [`Collection`]s of providers (environment,
//! files, database, memory) and keys to registered value types. Reads merge
//! every provider that holds a key, highest priority first, with lower
//! priorities only filling fields that are still unset. Writes go to the
//! first provider that accepts them.

pub mod collection;
pub mod constants;
pub mod error;
pub mod loader;
pub mod provider;
pub mod schema;
pub mod store;
pub mod structure;

pub use collection::Collection;
pub use error::{
    ConfigError, DecodeError, InvalidDecodeTarget, LoadError, PersistError, SchemaConflict,
};
pub use loader::{CollectionLoader, DatabaseLoader, DirectoryLoader};
pub use provider::{
    DatabaseProvider, DirectoryProvider, EnvProvider, MemoryProvider, Persist, Provider,
    SqliteConnection,
};
pub use schema::{AnyValue, ConfigValue, SchemaRegistry, SchemaSource, ValueType};
pub use store::{Instance, Saver, Store, StoreBuilder};
pub use structure::{Merge, StructDecoder, Structure};
