//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two attribute
/// maps with the same entries, or two prices with the same amount and type, are
/// interchangeable. Records that carry a storage id (product abstract rows,
/// image sets) are entities instead.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Price {
///     amount: u64,
///     price_type: String,
/// }
///
/// impl ValueObject for Price {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
