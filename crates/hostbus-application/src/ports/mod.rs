//! Port Interfaces
//!
//! Boundary contracts between the application layer and its collaborators.
//!
//! - **events** - Event hub publishing/observing contracts
//! - **clock** - Time and correlation id providers

/// Time and identifier providers
pub mod clock;
/// Event hub contracts
pub mod events;

pub use clock::{Clock, GuidProvider};
pub use events::{
    EventListener, EventNotifier, EventObserver, EventSource, EventStream, ObserverFn,
    Subscription,
};
