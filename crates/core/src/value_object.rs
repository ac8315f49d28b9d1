//! Value objects: compared by value, never by identity.

/// Marker for immutable values such as a `Sku` or a capability set.
///
/// Two instances holding the same data are interchangeable. To "change" one,
/// build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
