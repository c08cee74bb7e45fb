//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; they are defined entirely by their
//! attribute values. Invoice descriptions and settlement references are value
//! objects: two references with the same bytes are the same reference.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// construct a new one. Constructors are the place to enforce bounds, so a value
/// that exists is always valid.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Memo(String);
///
/// impl ValueObject for Memo {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
