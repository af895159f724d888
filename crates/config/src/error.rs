//! Error types for configuration resolution and persistence.
//!
//! Responsibilities:
//! - Define the caller-facing taxonomy (`ConfigError`) returned by the store.
//! - Define the layer errors raised by providers (`DecodeError`, `PersistError`)
//!   and collection loaders (`LoadError`).
//! - Define `SchemaConflict`, the startup-time registration failure.
//!
//! Does NOT handle:
//! - Codec-level failures (see `provider::codec::CodecError`).
//! - Database driver failures (see `provider::database::DatabaseError`).
//!
//! Invariants:
//! - `SchemaConflict` is never folded into `ConfigError`: a conflicting schema is a
//!   build-time misconfiguration, not a runtime condition.
//! - Every variant carries the key, namespace, or path it concerns.
//! - Loader errors are only ever logged by the store, never returned to callers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::provider::codec::CodecError;
use crate::provider::database::DatabaseError;

/// Errors returned by `Store` and its accessors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("collection not found: {namespace}")]
    CollectionNotFound { namespace: String },

    #[error("schema not found for key '{key}'")]
    SchemaNotFound { key: String },

    #[error("unknown type: no schema registered for key '{key}'")]
    UnknownType { key: String },

    #[error("invalid type for key '{key}': expected {expected}, got {found}")]
    InvalidType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("readonly instance for namespace '{namespace}' cannot be used as writable")]
    ReadOnly { namespace: String },

    #[error("failed to decode '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: DecodeError,
    },

    #[error("failed to persist '{key}': {source}")]
    Persist {
        key: String,
        #[source]
        source: PersistError,
    },
}

impl ConfigError {
    /// Returns true for failures caused by a missing namespace or schema, as
    /// opposed to backend failures.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ConfigError::CollectionNotFound { .. } | ConfigError::SchemaNotFound { .. }
        )
    }
}

/// A decode target the structural decoder cannot write into.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidDecodeTarget {
    /// The target (or a field of it, in strict mode) has no scalar or record shape.
    #[error("unsupported decode target {type_name} at '{key}'")]
    Unsupported { key: String, type_name: &'static str },

    /// The erased target is not of the type the backend holds for this key.
    #[error("decode target type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors raised while a provider fills a target value.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid value for {key}: {value:?} ({message})")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error(transparent)]
    InvalidTarget(#[from] InvalidDecodeTarget),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}")]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("stored document does not match the target shape: {0}")]
    Document(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("value not found for '{key}'")]
    NotFound { key: String },

    #[error("key '{key}' does not name a file below the provider directory")]
    InvalidKey { key: String },
}

/// Errors raised while a provider persists a value.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("no provider can save this key")]
    NoWritableProvider,

    #[error("no file codec is registered for {base}")]
    NoCodec { base: PathBuf },

    #[error("key '{key}' does not name a file below the provider directory")]
    InvalidKey { key: String },

    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode {path}")]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("value cannot be represented as a document: {0}")]
    Document(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Errors a collection loader may report. The store logs these and moves on
/// to the next loader.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("namespace '{namespace}' is not known to this loader")]
    NotFound { namespace: String },

    #[error("cannot access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("'{name}' does not name a directory below the loader root")]
    InvalidName { name: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// A schema pattern was registered twice with different value types.
///
/// Returned by schema registration; callers are expected to abort startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("schema {pattern} is already registered as {existing}, refusing {requested}")]
pub struct SchemaConflict {
    pub pattern: String,
    pub existing: &'static str,
    pub requested: &'static str,
}
