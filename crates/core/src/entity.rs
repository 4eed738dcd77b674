//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Only persisted records are entities; a product abstract that has not been
/// written yet has no identity to expose.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
