//! Centralized constants for the layered configuration engine.
//!
//! This module contains default separators and naming conventions shared by
//! the schema matcher, the providers, and the collection loaders.

// =============================================================================
// Key Layout
// =============================================================================

/// Separator between segments of a dotted configuration key.
pub const KEY_SEPARATOR: &str = ".";

/// Pattern segment that matches exactly one key segment.
pub const WILDCARD: &str = "*";

// =============================================================================
// Environment Provider
// =============================================================================

/// Default separator between the prefix, the key, and nested field names.
pub const DEFAULT_ENV_SEPARATOR: &str = "_";

/// Prefix used by the directory loader for per-namespace environment overrides.
///
/// The full prefix is `NS_` followed by the upper-cased namespace name.
pub const NAMESPACE_ENV_PREFIX: &str = "NS_";

// =============================================================================
// Database Provider
// =============================================================================

/// DDL for the two tables backing the database provider and loader.
///
/// Production deployments create these through their migration tooling;
/// `SqliteConnection::create_schema` runs it directly.
pub const DATABASE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS namespace (
    namespace VARCHAR NOT NULL,
    CONSTRAINT namespace_pkey PRIMARY KEY (namespace)
);

CREATE TABLE IF NOT EXISTS config (
    namespace VARCHAR NOT NULL,
    name VARCHAR NOT NULL,
    value TEXT NOT NULL,
    CONSTRAINT config_pkey PRIMARY KEY (namespace, name)
);
";
