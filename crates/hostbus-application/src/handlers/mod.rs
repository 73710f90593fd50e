//! Core Handlers
//!
//! Handlers owned by the dispatch + eventing core itself.

/// Long-lived bus event streaming query
pub mod stream_bus_events;

pub use stream_bus_events::{StreamBusEventsQuery, StreamBusEventsQueryHandler};
