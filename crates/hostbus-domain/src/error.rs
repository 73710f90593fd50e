//! Error handling types
//!
//! The taxonomy mirrors how failures are treated by the dispatch pipeline:
//! service errors are expected domain outcomes, transport errors are
//! recoverable, protocol violations are fatal contract mismatches, and
//! everything else is unexpected.

use crate::value_objects::ServiceError;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error source carried by infrastructure-level variants
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for hostbus
#[derive(Error, Debug)]
pub enum Error {
    /// Expected, user-facing domain failure with a machine-readable code
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// No handler registered for the dispatched request type
    #[error("Handler not found for request type {request_type}")]
    HandlerNotFound {
        /// Fully qualified request type name
        request_type: String,
    },

    /// The operation observed its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// Client/server contract mismatch
    #[error("Protocol violation: {message}")]
    Protocol {
        /// Description of the violated contract
        message: String,
    },

    /// Connection or transport failure (recoverable)
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxedSource>,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxedSource>,
    },

    /// Internal invariant broken
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },

    /// Anything else
    #[error("Unexpected error: {message}")]
    Unexpected {
        /// Description of the failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxedSource>,
    },
}

// Basic error creation methods
impl Error {
    /// Create a handler-not-found error
    pub fn handler_not_found<S: Into<String>>(request_type: S) -> Self {
        Self::HandlerNotFound {
            request_type: request_type.into(),
        }
    }

    /// Create a protocol violation error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an unexpected error
    pub fn unexpected<S: Into<String>>(message: S) -> Self {
        Self::Unexpected {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unexpected error with source
    pub fn unexpected_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Unexpected {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Transport error creation methods
impl Error {
    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error with source
    pub fn transport_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Configuration error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Classification helpers
impl Error {
    /// The service error payload, if this is an expected domain failure
    pub fn as_service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(err) => Some(err),
            _ => None,
        }
    }

    /// Machine-readable service error code
    pub fn service_code(&self) -> Option<&str> {
        self.as_service_error().map(|err| err.code.as_str())
    }

    /// Whether this error represents cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the failure is transient and worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
