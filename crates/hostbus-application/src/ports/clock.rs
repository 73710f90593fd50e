//! Clock and identifier ports
//!
//! Time and correlation ids come from injected providers so tests can pin
//! them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// Source of fresh identifiers
pub trait GuidProvider: Send + Sync {
    /// New unique identifier
    fn new_guid(&self) -> Uuid;
}
