//! # Domain Layer
//!
//! Core types shared by every other hostbus crate. This crate has no
//! runtime dependencies: it defines what flows through the dispatch
//! pipeline and the event bus, not how it flows.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`events`] | Event payloads broadcast to listeners |
//! | [`error`] | Error taxonomy and `Result` alias |
//! | [`value_objects`] | Service errors and execution context |
//! | [`constants`] | Service error codes and culture constants |

pub mod constants;
pub mod error;
pub mod events;
pub mod value_objects;

pub use error::{Error, Result};
pub use events::Event;
pub use value_objects::{ExecutionContext, Principal, ServiceError};
