//! Directory-of-files provider.
//!
//! Responsibilities:
//! - Locate `base/<key>.<ext>` by probing each registered codec's extensions.
//! - Decode the file through its codec into the target value.
//! - Write values back, creating the file with the first codec when absent.
//!
//! Does NOT handle:
//! - Watching files for changes; the collection cache decides freshness.
//! - Choosing the directory for a namespace (see `loader::directory`).
//!
//! Invariants:
//! - Probing follows codec registration order, then extension order; the
//!   first existing file wins for reads and writes alike.
//! - A read-only provider never touches the filesystem on `persist`.
//! - Keys resolve strictly below `base`: empty keys, `..`, `.` and absolute
//!   components are refused.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use super::codec::{FileCodec, JsonCodec, TomlCodec, YamlCodec};
use super::{Persist, Provider};
use crate::error::{DecodeError, PersistError};
use crate::schema::AnyValue;

/// Reads one file per key from a base directory.
pub struct DirectoryProvider {
    base: PathBuf,
    read_only: bool,
    codecs: Vec<Box<dyn FileCodec>>,
}

impl fmt::Debug for DirectoryProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codecs: Vec<_> = self.codecs.iter().map(|c| c.name()).collect();
        f.debug_struct("DirectoryProvider")
            .field("base", &self.base)
            .field("read_only", &self.read_only)
            .field("codecs", &codecs)
            .finish()
    }
}

impl DirectoryProvider {
    /// A provider with no codecs registered.
    pub fn new(base: impl Into<PathBuf>, read_only: bool) -> Self {
        Self {
            base: base.into(),
            read_only,
            codecs: Vec::new(),
        }
    }

    /// A provider understanding JSON, YAML and TOML, in that order.
    pub fn with_default_codecs(base: impl Into<PathBuf>, read_only: bool) -> Self {
        let mut provider = Self::new(base, read_only);
        provider.register_codec(JsonCodec::default());
        provider.register_codec(YamlCodec);
        provider.register_codec(TomlCodec);
        provider
    }

    pub fn register_codec(&mut self, codec: impl FileCodec + 'static) {
        self.codecs.push(Box::new(codec));
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn stem(&self, key: &str) -> Option<PathBuf> {
        contained(key).map(|relative| self.base.join(relative))
    }

    /// First existing file for `key` and the codec that owns its extension.
    fn locate(&self, key: &str) -> Option<(&dyn FileCodec, PathBuf)> {
        let stem = self.stem(key)?;
        self.codecs.iter().find_map(|codec| {
            codec.extensions().iter().find_map(|ext| {
                let path = with_extension(&stem, ext);
                path.is_file().then(|| (codec.as_ref(), path))
            })
        })
    }
}

/// `name` as a relative path that cannot leave the directory it is joined to.
pub(crate) fn contained(name: &str) -> Option<&Path> {
    let path = Path::new(name);
    let mut components = path.components().peekable();
    components.peek()?;
    components
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(path)
}

/// Append `.ext` without replacing dotted key segments (`test.0` → `test.0.json`).
fn with_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

impl Provider for DirectoryProvider {
    fn has(&self, key: &str) -> bool {
        self.locate(key).is_some()
    }

    fn decode(&self, key: &str, target: &mut dyn AnyValue) -> Result<(), DecodeError> {
        if contained(key).is_none() {
            return Err(DecodeError::InvalidKey {
                key: key.to_string(),
            });
        }
        let (codec, path) = self.locate(key).ok_or_else(|| DecodeError::NotFound {
            key: key.to_string(),
        })?;

        let file = File::open(&path).map_err(|source| DecodeError::Io {
            path: path.clone(),
            source,
        })?;
        let document = codec
            .decode(&mut BufReader::new(file))
            .map_err(|source| DecodeError::Codec {
                path: path.clone(),
                source,
            })?;

        // An empty file leaves the target at its default.
        if document.is_null() {
            return Ok(());
        }
        target.load_document(document)?;
        Ok(())
    }

    fn writer(&self) -> Option<&dyn Persist> {
        Some(self)
    }
}

impl Persist for DirectoryProvider {
    fn can_persist(&self, _key: &str) -> bool {
        !self.read_only
    }

    fn persist(&self, key: &str, value: &dyn AnyValue) -> Result<(), PersistError> {
        let stem = self.stem(key).ok_or_else(|| PersistError::InvalidKey {
            key: key.to_string(),
        })?;
        let (codec, path) = match self.locate(key) {
            Some(found) => found,
            None => {
                let codec = self.codecs.first().ok_or_else(|| PersistError::NoCodec {
                    base: self.base.clone(),
                })?;
                let ext = codec
                    .extensions()
                    .first()
                    .ok_or_else(|| PersistError::NoCodec {
                        base: self.base.clone(),
                    })?;
                (codec.as_ref(), with_extension(&stem, ext))
            }
        };

        let document = value.to_document()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PersistError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| PersistError::Io {
                path: path.clone(),
                source,
            })?;

        let mut writer = BufWriter::new(file);
        codec
            .encode(&mut writer, &document)
            .map_err(|source| PersistError::Codec {
                path: path.clone(),
                source,
            })?;
        writer.flush().map_err(|source| PersistError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(
            path = %path.display(),
            codec = codec.name(),
            "persisted configuration file"
        );
        Ok(())
    }
}
