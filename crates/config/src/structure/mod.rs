//! Shape descriptions for typed configuration values.
//!
//! Responsibilities:
//! - Describe the shape of a value (scalar leaf, record of named fields,
//!   optional slot, unsupported) so the structural decoder can walk it.
//! - Define the gap-filling merge used to overlay provider results.
//! - Provide the `record!` macro that wires both traits for a struct.
//!
//! Does NOT handle:
//! - Reading from any backend (see `decoder` and `provider`).
//! - Serialization formats; file and database backends go through serde.
//!
//! Invariants:
//! - A value is "unset" exactly when it equals its default: `0`, `0.0`,
//!   `false`, the empty string, an empty collection, `None`, JSON `null`.
//! - `Merge::merge_missing` never replaces a set value. A lower-priority
//!   value whose fields are themselves unset is indistinguishable from a
//!   missing one.

pub mod decoder;
mod primitives;

pub use decoder::StructDecoder;

/// A leaf value that can be parsed from its textual form.
pub trait Scalar {
    /// Parse `raw` and store the result, or describe why it is not valid.
    fn assign(&mut self, raw: &str) -> Result<(), String>;
}

/// An optional slot (`Option<T>`) the decoder fills on demand.
pub trait OptionalSlot {
    fn is_empty(&self) -> bool;

    /// Materialize a default inner value if the slot is empty and return it.
    fn fill(&mut self) -> &mut dyn Structure;

    fn clear(&mut self);
}

/// A named field of a record.
pub struct Field<'a> {
    pub name: &'static str,
    pub value: &'a mut dyn Structure,
}

impl<'a> Field<'a> {
    pub fn new(name: &'static str, value: &'a mut dyn Structure) -> Self {
        Self { name, value }
    }
}

/// Mutable view of a value's shape.
pub enum Shape<'a> {
    Scalar(&'a mut dyn Scalar),
    Record(Vec<Field<'a>>),
    Optional(&'a mut dyn OptionalSlot),
    /// Neither scalar nor record; carries the type name for diagnostics.
    Unsupported(&'static str),
}

/// Types the structural decoder can walk.
pub trait Structure {
    fn shape(&mut self) -> Shape<'_>;
}

/// Gap-filling overlay of a lower-priority value onto this one.
pub trait Merge {
    /// Copy from `lower` every part of `self` that is still unset.
    fn merge_missing(&mut self, lower: Self)
    where
        Self: Sized;
}

/// Implement [`Structure`] and [`Merge`] for a struct from its field list.
///
/// Every listed field must itself implement both traits. Field names become
/// the environment key segments (upper-cased by the decoder).
///
/// ```
/// use layered_config::record;
///
/// #[derive(Debug, Default, Clone, PartialEq)]
/// struct Limits {
///     max_connections: u32,
///     label: String,
/// }
///
/// record!(Limits { max_connections, label });
/// ```
#[macro_export]
macro_rules! record {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::structure::Structure for $ty {
            fn shape(&mut self) -> $crate::structure::Shape<'_> {
                $crate::structure::Shape::Record(vec![
                    $( $crate::structure::Field::new(stringify!($field), &mut self.$field), )+
                ])
            }
        }

        impl $crate::structure::Merge for $ty {
            fn merge_missing(&mut self, lower: Self) {
                $( $crate::structure::Merge::merge_missing(&mut self.$field, lower.$field); )+
            }
        }
    };
}
