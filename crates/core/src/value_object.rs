//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects carry no identity and are compared by their attribute values:
/// two `Money { 80, "USD" }` are the same money, while two stock items with
/// identical fields are still distinct items.
///
/// Values are built once and never mutated after being handed out. Derived
/// summaries (per-location quantity breakdowns, purchase-cost totals) are
/// value objects recomputed on every call.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
