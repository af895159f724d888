//! End-to-end resolution scenarios across real providers.
//!
//! Test coverage:
//! - Environment overrides layered over a directory file.
//! - Loader re-invocation after temporary namespaces are evicted.
//! - Writable round trips for each file format and the database.
//! - Type and read-only checks that must not reach any backend.
//! - Partial documents for types without `#[serde(default)]`.
//! - Concurrent readers, writers and namespace eviction.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use layered_config::provider::{Persist, Provider};
use layered_config::{
    AnyValue, Collection, ConfigError, DatabaseLoader, DecodeError, DirectoryLoader,
    DirectoryProvider, EnvProvider, LoadError, MemoryProvider, PersistError, SqliteConnection,
    Store, ValueType, record,
};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Inner {
    e: i64,
    f: f64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct TestConfig {
    a: i64,
    b: String,
    c: bool,
    d: Inner,
    g: String,
}

record!(Inner { e, f });
record!(TestConfig { a, b, c, d, g });

fn file_config() -> TestConfig {
    TestConfig {
        a: 5,
        b: "asdf".to_string(),
        c: true,
        d: Inner { e: 8, f: 1.5 },
        g: "from file".to_string(),
    }
}

fn write_json(dir: &std::path::Path, key: &str, value: &TestConfig) {
    fs::write(
        dir.join(format!("{key}.json")),
        serde_json::to_string(value).unwrap(),
    )
    .unwrap();
}

#[test]
fn test_environment_overrides_file_and_file_fills_the_rest() {
    let dir = TempDir::new().unwrap();
    write_json(dir.path(), "test.0", &file_config());

    let env = EnvProvider::from_vars([("CONFIG_TEST.0_G", "from env")]).with_prefix("CONFIG");
    let files = DirectoryProvider::with_default_codecs(dir.path(), true);

    let collection = Collection::new();
    collection.add_providers([
        Arc::new(env) as Arc<dyn Provider>,
        Arc::new(files) as Arc<dyn Provider>,
    ]);

    let store = Store::builder()
        .schema::<TestConfig>("test.*")
        .unwrap()
        .collection("default", collection)
        .build();

    let value = store.get_as::<TestConfig>("default", "test.0").unwrap();
    assert_eq!(
        value,
        Some(TestConfig {
            g: "from env".to_string(),
            ..file_config()
        })
    );

    // Same schema, key no provider holds.
    assert_eq!(store.get_as::<TestConfig>("default", "test.1").unwrap(), None);
}

#[test]
fn test_remove_temporary_reruns_loader_chain() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let store = Store::builder()
        .schema::<i64>("answer")
        .unwrap()
        .loader(move |_: &str| -> Result<Option<Arc<Collection>>, LoadError> {
            counter.fetch_add(1, Ordering::SeqCst);
            let memory = MemoryProvider::new();
            memory.insert("answer", 42_i64);
            Ok(Some(Arc::new(Collection::temporary().with_provider(memory))))
        })
        .collection("pinned", Collection::new())
        .build();

    assert_eq!(store.get_as::<i64>("dynamic", "answer").unwrap(), Some(42));
    assert_eq!(store.get_as::<i64>("dynamic", "answer").unwrap(), Some(42));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    store.remove_temporary();
    assert!(!store.has_namespace("dynamic"));
    assert!(store.has_namespace("pinned"));

    assert_eq!(store.get_as::<i64>("dynamic", "answer").unwrap(), Some(42));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Provider that fails the test if it is ever asked anything.
#[derive(Debug)]
struct Untouchable;

impl Provider for Untouchable {
    fn has(&self, key: &str) -> bool {
        panic!("unexpected has({key})");
    }

    fn decode(&self, key: &str, _target: &mut dyn AnyValue) -> Result<(), DecodeError> {
        panic!("unexpected decode({key})");
    }

    fn writer(&self) -> Option<&dyn Persist> {
        Some(self)
    }
}

impl Persist for Untouchable {
    fn can_persist(&self, key: &str) -> bool {
        panic!("unexpected can_persist({key})");
    }

    fn persist(&self, key: &str, _value: &dyn AnyValue) -> Result<(), PersistError> {
        panic!("unexpected persist({key})");
    }
}

#[test]
fn test_invalid_type_never_reaches_providers() {
    let store = Store::builder()
        .schema::<TestConfig>("test.*")
        .unwrap()
        .collection("default", Collection::new().with_provider(Untouchable))
        .build();

    let err = store
        .set_value("default", "test.0", Inner::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidType { ref key, .. } if key == "test.0"));
}

#[test]
fn test_read_only_accessor_fails_before_providers() {
    let store = Store::builder()
        .schema::<TestConfig>("test.*")
        .unwrap()
        .collection("default", Collection::new().with_provider(Untouchable))
        .build();

    let instance = store.config("default").unwrap();
    assert!(matches!(
        instance.get_writable("test.0"),
        Err(ConfigError::ReadOnly { .. })
    ));
}

fn writable_directory_store(dir: &std::path::Path) -> Store {
    Store::builder()
        .schema::<TestConfig>("test.*")
        .unwrap()
        .loader(DirectoryLoader::new(dir, false))
        .build()
}

#[test]
fn test_writable_round_trip_for_each_file_format() {
    for (file, content) in [
        ("test.0.json", "{}"),
        ("test.0.yml", "a: 1\n"),
        ("test.0.yaml", "a: 1\n"),
        ("test.0.toml", "a = 1\n"),
    ] {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("app");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();

        let store = writable_directory_store(root.path());
        let instance = store.writable("app").unwrap();
        let (_, saver) = instance.get_writable("test.0").unwrap();
        saver.save(file_config()).unwrap();

        // The existing file is rewritten in its own format.
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1, "{file}");

        store.clear_all_caches();
        assert_eq!(
            instance.get_as::<TestConfig>("test.0").unwrap(),
            Some(file_config()),
            "{file}"
        );
    }
}

#[test]
fn test_writable_round_trip_through_database() {
    let conn = SqliteConnection::open_in_memory().unwrap();
    conn.create_schema().unwrap();

    let store = Store::builder()
        .schema::<TestConfig>("test.*")
        .unwrap()
        .loader(DatabaseLoader::new(Arc::new(conn), false))
        .build();

    store.set_value("tenant", "test.7", file_config()).unwrap();
    store.remove_temporary();

    assert_eq!(
        store.get_as::<TestConfig>("tenant", "test.7").unwrap(),
        Some(file_config())
    );
}

#[test]
fn test_read_only_directory_reports_no_writable_provider() {
    let root = TempDir::new().unwrap();
    fs::create_dir(root.path().join("app")).unwrap();

    let store = Store::builder()
        .schema::<TestConfig>("test.*")
        .unwrap()
        .loader(DirectoryLoader::new(root.path(), true))
        .build();

    let err = store
        .set_value("app", "test.0", file_config())
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Persist {
            source: PersistError::NoWritableProvider,
            ..
        }
    ));
}

#[test]
fn test_malformed_environment_value_surfaces_as_decode_error() {
    let dir = TempDir::new().unwrap();
    write_json(dir.path(), "test.0", &file_config());

    let collection = Collection::new();
    collection.add_providers([
        Arc::new(EnvProvider::from_vars([("TEST.0_A", "many")])) as Arc<dyn Provider>,
        Arc::new(DirectoryProvider::with_default_codecs(dir.path(), true)) as Arc<dyn Provider>,
    ]);

    let err = collection
        .resolve("test.0", &ValueType::of::<TestConfig>())
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Decode {
            source: DecodeError::InvalidValue { .. },
            ..
        }
    ));
}

#[test]
fn test_failing_loader_falls_through_to_next() {
    let root = TempDir::new().unwrap();
    let conn = SqliteConnection::open_in_memory().unwrap();
    conn.create_schema().unwrap();

    let store = Store::builder()
        .schema::<i64>("retries")
        .unwrap()
        .loader(DirectoryLoader::new(root.path(), true))
        .loader(DatabaseLoader::new(Arc::new(conn), false))
        .build();

    store.set_value("missing-dir", "retries", 3_i64).unwrap();
    assert_eq!(store.get_as::<i64>("missing-dir", "retries").unwrap(), Some(3));
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Plain {
    a: i64,
    b: String,
}

record!(Plain { a, b });

#[test]
fn test_partial_file_fills_only_present_fields() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("k.json"), r#"{"a": 3}"#).unwrap();

    let env = EnvProvider::from_vars([("K_B", "from env")]);
    let collection = Collection::new();
    collection.add_providers([
        Arc::new(DirectoryProvider::with_default_codecs(dir.path(), true)) as Arc<dyn Provider>,
        Arc::new(env) as Arc<dyn Provider>,
    ]);

    let store = Store::builder()
        .schema::<Plain>("k")
        .unwrap()
        .collection("default", collection)
        .build();

    assert_eq!(
        store.get_as::<Plain>("default", "k").unwrap(),
        Some(Plain {
            a: 3,
            b: "from env".to_string(),
        })
    );
}

fn memory_store(namespaces: &[&str]) -> Store {
    let mut builder = Store::builder().schema::<i64>("counter.*").unwrap();
    for (index, namespace) in namespaces.iter().enumerate() {
        let memory = MemoryProvider::new();
        memory.insert("counter.value", index as i64 + 1);
        builder = builder.collection(*namespace, Collection::new().with_provider(memory));
    }
    builder.build()
}

#[test]
fn test_concurrent_reads_across_namespaces() {
    let namespaces = ["alpha", "beta", "gamma", "delta"];
    let store = memory_store(&namespaces);

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..100 {
                    for (index, namespace) in namespaces.iter().enumerate() {
                        assert_eq!(
                            store.get_as::<i64>(namespace, "counter.value").unwrap(),
                            Some(index as i64 + 1)
                        );
                    }
                }
            });
        }
    });
}

#[test]
fn test_concurrent_writes_and_reads_settle_on_last_write() {
    let store = memory_store(&["alpha", "beta"]);

    thread::scope(|scope| {
        for namespace in ["alpha", "beta"] {
            let store = &store;
            scope.spawn(move || {
                for value in 10..=60_i64 {
                    store.set_value(namespace, "counter.value", value).unwrap();
                }
            });
            for _ in 0..3 {
                scope.spawn(move || {
                    for _ in 0..200 {
                        let seen = store.get_as::<i64>(namespace, "counter.value").unwrap();
                        assert!(matches!(seen, Some(1..=60)), "unexpected {seen:?}");
                    }
                });
            }
        }
    });

    store.clear_all_caches();
    for namespace in ["alpha", "beta"] {
        assert_eq!(
            store.get_as::<i64>(namespace, "counter.value").unwrap(),
            Some(60)
        );
    }
}

#[test]
fn test_remove_temporary_races_reads() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);

    let store = Store::builder()
        .schema::<i64>("answer")
        .unwrap()
        .loader(move |_: &str| -> Result<Option<Arc<Collection>>, LoadError> {
            counter.fetch_add(1, Ordering::SeqCst);
            let memory = MemoryProvider::new();
            memory.insert("answer", 42_i64);
            Ok(Some(Arc::new(Collection::temporary().with_provider(memory))))
        })
        .build();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..200 {
                    assert_eq!(store.get_as::<i64>("dynamic", "answer").unwrap(), Some(42));
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..50 {
                store.remove_temporary();
                thread::yield_now();
            }
        });
    });

    assert!(loads.load(Ordering::SeqCst) >= 1);
    store.remove_temporary();
    assert!(!store.has_namespace("dynamic"));
}
