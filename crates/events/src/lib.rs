//! Domain events shared by the catalog aggregates.
//!
//! Aggregates emit typed events; persistence adapters turn them into
//! [`EventRecord`]s once the aggregate snapshot has been written.

pub mod event;
pub mod record;

pub use event::Event;
pub use record::EventRecord;
