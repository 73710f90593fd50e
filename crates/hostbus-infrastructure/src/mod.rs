//! # Infrastructure Layer
//!
//! Technical implementations of the application ports plus the ambient
//! concerns every host process needs.
//!
//! ## Module Categories
//!
//! ### Eventing
//! | Module | Description |
//! |--------|-------------|
//! | [`events`] | In-process event bus and service host listener |
//! | [`interceptors`] | Performance logging around dispatched requests |
//! | [`clock`] | System clock and random id providers |
//!
//! ### Configuration & Bootstrap
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Figment-layered TOML/env configuration |
//! | [`bootstrap`] | Core service wiring |
//! | [`constants`] | Centralized configuration constants |
//!
//! ### Observability
//! | Module | Description |
//! |--------|-------------|
//! | [`logging`] | Structured logging with tracing |
//! | [`utils`] | Timing helpers |

pub mod bootstrap;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error_ext;
pub mod events;
pub mod interceptors;
pub mod logging;
pub mod utils;

// Re-export commonly used types
pub use error_ext::ErrorContext;
pub use events::{EventBus, ServiceHostEventListener};
pub use utils::TimedOperation;
