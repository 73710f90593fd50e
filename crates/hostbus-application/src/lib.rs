//! Application Layer - hostbus
//!
//! Ports and orchestration logic for the dispatch + eventing core.
//!
//! ## Architecture
//!
//! The application layer:
//! - Defines ports (interfaces) for event hubs, clocks and id providers
//! - Implements the command/query dispatch pipeline and its interceptor chain
//! - Provides handlers that belong to the core, such as bus event streaming
//! - Has no dependencies on infrastructure or transport frameworks
//!
//! ## Dependencies
//!
//! This crate depends only on:
//! - `hostbus-domain`: For events, errors and execution context
//! - Pure Rust libraries for async, streams and logging

pub mod dispatch;
pub mod handlers;
pub mod ports;

pub use dispatch::*;
pub use handlers::*;
pub use ports::*;
