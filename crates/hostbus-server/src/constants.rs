//! Server-specific constants
//!
//! gRPC metadata keys shared by the server interceptor and the client
//! writer. Keys ending in `-bin` carry binary values.

// ============================================================================
// EXECUTION CONTEXT HEADERS
// ============================================================================

/// Authentication type of the calling principal (ASCII)
pub const HEADER_AUTHENTICATION_TYPE: &str = "identity-authentication-type";

/// Name of the calling principal (binary, UTF-8 payload)
pub const HEADER_IDENTITY_NAME: &str = "identity-name-bin";

/// Formatting culture of the call (ASCII)
pub const HEADER_CULTURE: &str = "culture-name";

/// UI culture of the call (ASCII)
pub const HEADER_UI_CULTURE: &str = "ui-culture-name";

// ============================================================================
// SERVICE ERROR TRAILERS
// ============================================================================

/// Machine-readable service error code (ASCII)
pub const TRAILER_SERVICE_ERROR_CODE: &str = "service-error-code";

/// One service error argument per value (binary, UTF-8 payload)
pub const TRAILER_SERVICE_ERROR_ARG: &str = "service-error-arg-bin";
