use chrono::{DateTime, Utc};

/// A domain-agnostic event.
///
/// Events are immutable facts, versioned for schema evolution, and
/// append-only.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Identifier of the aggregate the event belongs to.
    type AggregateId: Copy + Eq + core::fmt::Debug + core::fmt::Display;

    /// Stable event name/type identifier (e.g. "catalog.product.version_added").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    fn aggregate_id(&self) -> Self::AggregateId;

    /// When the event occurred (audit time, not business date).
    fn occurred_at(&self) -> DateTime<Utc>;
}
