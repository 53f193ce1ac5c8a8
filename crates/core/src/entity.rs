//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Parts, stock items and locations are entities: they are looked up by id and
/// remain the same record even when their attributes change upstream.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
