//! Service errors
//!
//! Expected, user-facing domain failures (validation, not-found, conflict).
//! They are surfaced to callers as structured results and logged below
//! error level.

use crate::constants::{
    SERVICE_ERROR_CONFLICT, SERVICE_ERROR_NOT_FOUND, SERVICE_ERROR_PRECONDITION,
    SERVICE_ERROR_VALIDATION,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain failure carrying a machine-readable code and arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}{}", rendered_args(.args))]
pub struct ServiceError {
    /// Machine-readable code
    pub code: String,
    /// Arguments used to render a localized message
    pub args: Vec<String>,
}

impl ServiceError {
    /// Create a service error with an explicit code
    pub fn new<C, I, A>(code: C, args: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            code: code.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Request failed validation
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::new(SERVICE_ERROR_VALIDATION, [message.into()])
    }

    /// Requested resource does not exist
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::new(SERVICE_ERROR_NOT_FOUND, [resource.into()])
    }

    /// Request conflicts with current state
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::new(SERVICE_ERROR_CONFLICT, [message.into()])
    }

    /// Request not allowed in current state
    pub fn precondition<S: Into<String>>(message: S) -> Self {
        Self::new(SERVICE_ERROR_PRECONDITION, [message.into()])
    }
}

fn rendered_args(args: &[String]) -> String {
    if args.is_empty() {
        String::new()
    } else {
        format!(" ({})", args.join(", "))
    }
}
