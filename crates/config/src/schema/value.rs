//! Typed and type-erased configuration values.
//!
//! Responsibilities:
//! - Define `ConfigValue`, the bound every schema shape satisfies.
//! - Define `AnyValue`, the object-safe view the collection and providers
//!   operate on, and `ValueType`, the descriptor registered per pattern.
//!
//! Does NOT handle:
//! - Pattern matching (see `matcher`).
//! - Backend I/O (see `provider`).
//!
//! Invariants:
//! - Two `ValueType`s are equal exactly when they describe the same Rust type.
//! - `ValueType::fresh` always yields the type's `Default` value.

use std::any::{Any, TypeId, type_name};
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::InvalidDecodeTarget;
use crate::structure::{Merge, Structure};

/// A type that can be registered as a configuration schema.
///
/// Implemented automatically; user structs typically derive `Default`,
/// `Clone`, `Debug`, `Serialize`, `Deserialize` (with `#[serde(default)]`) and
/// invoke [`record!`](crate::record).
pub trait ConfigValue:
    Structure
    + Merge
    + Serialize
    + DeserializeOwned
    + Default
    + Clone
    + fmt::Debug
    + Send
    + Sync
    + 'static
{
}

impl<T> ConfigValue for T where
    T: Structure
        + Merge
        + Serialize
        + DeserializeOwned
        + Default
        + Clone
        + fmt::Debug
        + Send
        + Sync
        + 'static
{
}

/// Object-safe view of a [`ConfigValue`].
pub trait AnyValue: Any + Send + Sync + fmt::Debug + 'static {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn type_name(&self) -> &'static str;

    /// Shape view for the structural decoder.
    fn structure(&mut self) -> &mut dyn Structure;

    /// Overlay `document` onto this value.
    ///
    /// Fields the document omits, or sets to `null`, keep their current
    /// value, so partial documents decode without `#[serde(default)]`.
    fn load_document(&mut self, document: serde_json::Value) -> Result<(), serde_json::Error>;

    fn to_document(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Gap-filling merge of a lower-priority value of the same type.
    fn merge_missing_any(&mut self, lower: Box<dyn AnyValue>) -> Result<(), InvalidDecodeTarget>;

    /// Overwrite this value with a copy of `source`.
    fn assign_from(&mut self, source: &dyn AnyValue) -> Result<(), InvalidDecodeTarget>;

    fn clone_boxed(&self) -> Box<dyn AnyValue>;
}

impl<T: ConfigValue> AnyValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn structure(&mut self) -> &mut dyn Structure {
        self
    }

    fn load_document(&mut self, document: serde_json::Value) -> Result<(), serde_json::Error> {
        let mut current = serde_json::to_value(&*self)?;
        overlay(&mut current, document);
        *self = serde_json::from_value(current)?;
        Ok(())
    }

    fn to_document(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn merge_missing_any(&mut self, lower: Box<dyn AnyValue>) -> Result<(), InvalidDecodeTarget> {
        let found = lower.type_name();
        let lower = lower
            .into_any()
            .downcast::<T>()
            .map_err(|_| InvalidDecodeTarget::TypeMismatch {
                expected: type_name::<T>(),
                found,
            })?;
        self.merge_missing(*lower);
        Ok(())
    }

    fn assign_from(&mut self, source: &dyn AnyValue) -> Result<(), InvalidDecodeTarget> {
        let source = source.as_any().downcast_ref::<T>().ok_or_else(|| {
            InvalidDecodeTarget::TypeMismatch {
                expected: type_name::<T>(),
                found: source.type_name(),
            }
        })?;
        self.clone_from(source);
        Ok(())
    }

    fn clone_boxed(&self) -> Box<dyn AnyValue> {
        Box::new(self.clone())
    }
}

fn overlay(base: &mut serde_json::Value, document: serde_json::Value) {
    use serde_json::Value;

    match (base, document) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(fields)) => {
            for (name, value) in fields {
                match base.get_mut(&name) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        if !value.is_null() {
                            base.insert(name, value);
                        }
                    }
                }
            }
        }
        (base, document) => *base = document,
    }
}

impl dyn AnyValue {
    /// Identity of the concrete type behind the trait object.
    pub fn value_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }

    pub fn downcast_ref<T: ConfigValue>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

fn fresh_default<T: ConfigValue>() -> Box<dyn AnyValue> {
    Box::new(T::default())
}

/// Descriptor of a registered value shape.
#[derive(Clone, Copy)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
    fresh: fn() -> Box<dyn AnyValue>,
}

impl ValueType {
    pub fn of<T: ConfigValue>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            fresh: fresh_default::<T>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A new default instance to decode into.
    pub fn fresh(&self) -> Box<dyn AnyValue> {
        (self.fresh)()
    }

    /// Whether `value` is exactly of this type.
    pub fn describes(&self, value: &dyn AnyValue) -> bool {
        value.value_type_id() == self.id
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueType {}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueType").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Endpoint {
        host: String,
        port: u16,
    }

    crate::record!(Endpoint { host, port });

    #[test]
    fn test_value_type_identity() {
        assert_eq!(ValueType::of::<Endpoint>(), ValueType::of::<Endpoint>());
        assert_ne!(ValueType::of::<Endpoint>(), ValueType::of::<String>());
        assert!(ValueType::of::<Endpoint>().name().ends_with("Endpoint"));
    }

    #[test]
    fn test_fresh_is_default_and_described() {
        let vt = ValueType::of::<Endpoint>();
        let fresh = vt.fresh();
        assert!(vt.describes(fresh.as_ref()));
        assert_eq!(fresh.downcast_ref::<Endpoint>(), Some(&Endpoint::default()));
    }

    #[test]
    fn test_document_round_trip_through_erased_value() {
        let mut value = ValueType::of::<Endpoint>().fresh();
        value
            .load_document(serde_json::json!({"host": "db", "port": 5432}))
            .unwrap();
        assert_eq!(
            value.to_document().unwrap(),
            serde_json::json!({"host": "db", "port": 5432})
        );
    }

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Plain {
        a: i64,
        b: String,
        inner: Nested,
    }

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Nested {
        x: u8,
        y: Option<String>,
    }

    crate::record!(Plain { a, b, inner });
    crate::record!(Nested { x, y });

    #[test]
    fn test_partial_document_keeps_defaults_without_serde_default() {
        let mut value = ValueType::of::<Plain>().fresh();
        value
            .load_document(serde_json::json!({"a": 3, "inner": {"y": "set"}}))
            .unwrap();
        assert_eq!(
            value.downcast_ref::<Plain>(),
            Some(&Plain {
                a: 3,
                b: String::new(),
                inner: Nested {
                    x: 0,
                    y: Some("set".to_string()),
                },
            })
        );
    }

    #[test]
    fn test_null_fields_keep_current_value() {
        let mut value = ValueType::of::<Plain>().fresh();
        value
            .load_document(serde_json::json!({"a": 1, "b": null, "inner": null}))
            .unwrap();
        assert_eq!(value.downcast_ref::<Plain>().map(|p| p.a), Some(1));
    }

    #[test]
    fn test_document_of_wrong_shape_still_fails() {
        let mut value = ValueType::of::<Plain>().fresh();
        assert!(value.load_document(serde_json::json!({"a": "three"})).is_err());
    }

    #[test]
    fn test_erased_merge_rejects_other_types() {
        let mut value = ValueType::of::<Endpoint>().fresh();
        let err = value
            .merge_missing_any(Box::new("text".to_string()))
            .unwrap_err();
        assert!(matches!(err, InvalidDecodeTarget::TypeMismatch { .. }));
    }

    #[test]
    fn test_erased_merge_fills_gaps() {
        let mut value: Box<dyn AnyValue> = Box::new(Endpoint {
            host: "primary".to_string(),
            port: 0,
        });
        value
            .merge_missing_any(Box::new(Endpoint {
                host: "secondary".to_string(),
                port: 6432,
            }))
            .unwrap();
        assert_eq!(
            value.downcast_ref::<Endpoint>(),
            Some(&Endpoint {
                host: "primary".to_string(),
                port: 6432,
            })
        );
    }
}
