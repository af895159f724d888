//! Structural decoder: fills a typed value from flat key-value pairs.
//!
//! Responsibilities:
//! - Walk a value's shape and assign each scalar leaf from a lookup function.
//! - Build leaf keys by joining the prefix and (transformed) field names with
//!   the separator, upper-casing the result.
//!
//! Does NOT handle:
//! - Snapshotting the process environment (see `provider::env`).
//! - Merging results of several providers (see `collection`).
//!
//! Invariants:
//! - Keys the lookup does not know leave the destination untouched.
//! - An `Option` that was `None` stays `None` unless a key below it was found.
//! - Unsupported shapes fail only in strict mode.

use crate::constants::DEFAULT_ENV_SEPARATOR;
use crate::error::{DecodeError, InvalidDecodeTarget};

use super::{Shape, Structure};

type Lookup<'a> = Box<dyn Fn(&str) -> Option<String> + Send + Sync + 'a>;

/// Decoder from flat, separator-joined keys into a [`Structure`].
pub struct StructDecoder<'a> {
    lookup: Lookup<'a>,
    prefix: String,
    separator: String,
    strict: bool,
    name_transform: Option<fn(&str) -> String>,
}

impl Default for StructDecoder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl StructDecoder<'static> {
    /// A decoder reading the process environment, with `_` as separator and
    /// lower-casing field names.
    pub fn new() -> Self {
        Self {
            lookup: Box::new(|key| std::env::var(key).ok()),
            prefix: String::new(),
            separator: DEFAULT_ENV_SEPARATOR.to_string(),
            strict: false,
            name_transform: Some(str::to_lowercase),
        }
    }
}

impl<'a> StructDecoder<'a> {
    /// Replace the key lookup.
    pub fn with_lookup<'b>(
        self,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'b,
    ) -> StructDecoder<'b> {
        StructDecoder {
            lookup: Box::new(lookup),
            prefix: self.prefix,
            separator: self.separator,
            strict: self.strict,
            name_transform: self.name_transform,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Fail on fields that are neither scalar nor record instead of skipping them.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Transform applied to each field name before joining; `None` keeps names as-is.
    pub fn with_name_transform(mut self, transform: Option<fn(&str) -> String>) -> Self {
        self.name_transform = transform;
        self
    }

    /// Fill `target` from the lookup.
    pub fn decode(&self, target: &mut dyn Structure) -> Result<(), DecodeError> {
        let mut assigned = 0;
        self.visit(&self.prefix, target, &mut assigned)
    }

    fn visit(
        &self,
        current: &str,
        node: &mut dyn Structure,
        assigned: &mut usize,
    ) -> Result<(), DecodeError> {
        let current = current.to_uppercase();
        match node.shape() {
            Shape::Scalar(scalar) => {
                if let Some(raw) = (self.lookup)(&current) {
                    scalar
                        .assign(&raw)
                        .map_err(|message| DecodeError::InvalidValue {
                            key: current.clone(),
                            value: raw,
                            message,
                        })?;
                    *assigned += 1;
                }
            }
            Shape::Record(fields) => {
                for field in fields {
                    let child = self.child_name(&current, field.name);
                    self.visit(&child, field.value, assigned)?;
                }
            }
            Shape::Optional(slot) => {
                let was_empty = slot.is_empty();
                let before = *assigned;
                self.visit(&current, slot.fill(), assigned)?;
                if was_empty && *assigned == before {
                    slot.clear();
                }
            }
            Shape::Unsupported(type_name) => {
                if self.strict {
                    return Err(InvalidDecodeTarget::Unsupported {
                        key: current,
                        type_name,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    fn child_name(&self, current: &str, child: &str) -> String {
        let child = match self.name_transform {
            Some(transform) => transform(child),
            None => child.to_string(),
        };
        if current.is_empty() {
            child
        } else {
            format!("{current}{}{child}", self.separator)
        }
    }
}
