//! Domain layer constants
//!
//! Contains constants that are part of the domain logic and are used by
//! the application layer. Infrastructure-specific constants remain in
//! `hostbus_infrastructure::constants`.

// ============================================================================
// SERVICE ERROR CODES
// ============================================================================

/// Request failed validation
pub const SERVICE_ERROR_VALIDATION: &str = "validation_failed";

/// Requested entity does not exist
pub const SERVICE_ERROR_NOT_FOUND: &str = "not_found";

/// Request conflicts with the current state
pub const SERVICE_ERROR_CONFLICT: &str = "conflict";

/// Request is not allowed in the current state
pub const SERVICE_ERROR_PRECONDITION: &str = "precondition_failed";

// ============================================================================
// CULTURE CONSTANTS
// ============================================================================

/// Invariant culture name
pub const INVARIANT_CULTURE: &str = "";
