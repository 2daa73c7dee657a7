use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::event::Event;

/// A committed event, detached from its typed form.
///
/// Produced by persistence adapters after the aggregate write succeeded, so a
/// record only ever describes durable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: Uuid,
    /// Display form of the aggregate identifier.
    pub aggregate_id: String,
    pub aggregate_type: String,
    /// Aggregate revision reached by applying this event.
    pub revision: u64,
    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,
    pub payload: JsonValue,
}

impl EventRecord {
    /// Build a record from a typed event.
    pub fn from_typed<E>(
        event: &E,
        aggregate_type: impl Into<String>,
        revision: u64,
    ) -> Result<Self, serde_json::Error>
    where
        E: Event + Serialize,
    {
        Ok(Self {
            event_id: Uuid::now_v7(),
            aggregate_id: event.aggregate_id().to_string(),
            aggregate_type: aggregate_type.into(),
            revision,
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload: serde_json::to_value(event)?,
        })
    }
}
