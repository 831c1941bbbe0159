//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Orders keep their identity while their export status changes, which is what
/// lets a commit mark "the same" orders a preview counted.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Whether `other` refers to the same entity (regardless of state).
    fn same_identity_as(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
