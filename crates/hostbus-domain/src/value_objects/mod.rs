//! Domain Value Objects
//!
//! Immutable value objects that represent concepts in the domain
//! without identity.
//!
//! | Value Object | Description |
//! |--------------|-------------|
//! | [`ServiceError`] | Expected domain failure with code and arguments |
//! | [`ExecutionContext`] | Caller identity and cultures for one request |
//! | [`Principal`] | Caller identity |

/// Execution context value objects
pub mod execution_context;
/// Service error value object
pub mod service_error;

pub use execution_context::{ExecutionContext, Principal};
pub use service_error::ServiceError;
