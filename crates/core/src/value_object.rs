//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values — a unit
/// code, a conversion edge, a ledger amount. To "modify" one, construct a new
/// one; this keeps them safe to share across threads and predictable to test.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
