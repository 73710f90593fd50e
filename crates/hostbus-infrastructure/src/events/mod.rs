//! Event hubs
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EventBus`] | In-process hub with per-observer failure isolation |
//! | [`ServiceHostEventListener`] | Mirror of a service host's event stream with reconnect |

mod bus;
mod listener;

pub use bus::EventBus;
pub use listener::ServiceHostEventListener;
