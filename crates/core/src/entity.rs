//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Marketplace records reference each other only by id; reverse relations
/// (a seller's items, a buyer's purchases) are queries, not fields.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Entity name used in error messages and log fields (e.g. `"item"`).
    const KIND: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
