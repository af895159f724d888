//! Configuration backends.
//!
//! Responsibilities:
//! - Define the `Provider` contract (existence probe plus decode) and the
//!   optional `Persist` capability.
//! - Host the concrete backends: environment, directory of files, database,
//!   and in-memory map.
//!
//! Does NOT handle:
//! - Priority ordering or merging of several providers (see `collection`).
//! - Caching; every call goes to the backend.
//!
//! Invariants:
//! - `has` never mutates backend state and returns the same answer for the
//!   same backend contents.
//! - Whether a provider can persist is fixed by its type: `writer()` returns
//!   the same capability for the provider's whole lifetime.

use std::fmt;

use crate::error::{DecodeError, PersistError};
use crate::schema::AnyValue;

pub mod codec;
pub mod database;
pub mod directory;
pub mod env;
pub mod memory;

pub use codec::{FileCodec, JsonCodec, TomlCodec, YamlCodec};
pub use database::{Connection, DatabaseProvider, SqliteConnection};
pub use directory::DirectoryProvider;
pub use env::EnvProvider;
pub use memory::MemoryProvider;

/// A source of configuration values keyed by dotted key.
pub trait Provider: Send + Sync + fmt::Debug {
    /// Whether this backend holds anything for `key`.
    fn has(&self, key: &str) -> bool;

    /// Fill `target` from the backend's representation of `key`.
    ///
    /// Only called after `has(key)` returned true; implementations still fail
    /// cleanly when called otherwise.
    fn decode(&self, key: &str, target: &mut dyn AnyValue) -> Result<(), DecodeError>;

    /// Persistence capability, if this backend supports writes.
    fn writer(&self) -> Option<&dyn Persist> {
        None
    }
}

/// Write side of a provider.
pub trait Persist: Send + Sync {
    /// Whether a `persist` call for `key` would be accepted.
    fn can_persist(&self, key: &str) -> bool;

    fn persist(&self, key: &str, value: &dyn AnyValue) -> Result<(), PersistError>;
}
