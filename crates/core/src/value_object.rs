//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. Two
/// `DateRange`s covering the same days are the same range; an export filter
/// built from them selects the same rows.
///
/// ```ignore
/// let a = DateRange::parse("2024-06-01", "2024-06-30")?;
/// let b = DateRange::parse("2024-06-01", "2024-06-30")?;
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
