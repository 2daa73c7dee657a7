//! Value object trait: equality by value, not identity.
//!
//! Value objects have no identity. Date ranges and rule parameter values are
//! the main examples in this workspace: two ranges with the same bounds are the
//! same range.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one with the new values.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Window {
///     start: NaiveDate,
///     end: Option<NaiveDate>,
/// }
///
/// impl ValueObject for Window {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
