//! Execution context
//!
//! Caller identity and culture settings for one request. The context is
//! passed explicitly through the call chain rather than stored in ambient
//! thread-local state.

use crate::constants::INVARIANT_CULTURE;
use serde::{Deserialize, Serialize};

/// Caller identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Authentication scheme, e.g. `Cookies` or `Bearer`
    pub authentication_type: Option<String>,
    /// Identity name
    pub name: Option<String>,
}

impl Principal {
    /// Unauthenticated principal
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated principal
    pub fn authenticated<A: Into<String>, N: Into<String>>(
        authentication_type: A,
        name: N,
    ) -> Self {
        Self {
            authentication_type: Some(authentication_type.into()),
            name: Some(name.into()),
        }
    }

    /// An identity is authenticated only when both the scheme and the name are known
    pub fn is_authenticated(&self) -> bool {
        self.authentication_type.is_some() && self.name.is_some()
    }
}

/// Identity and culture settings carried by a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Caller identity
    pub principal: Principal,
    /// Culture used for formatting
    pub culture: String,
    /// Culture used for resource lookup
    pub ui_culture: String,
}

impl ExecutionContext {
    /// Create a context
    pub fn new<C: Into<String>, U: Into<String>>(
        principal: Principal,
        culture: C,
        ui_culture: U,
    ) -> Self {
        Self {
            principal,
            culture: culture.into(),
            ui_culture: ui_culture.into(),
        }
    }

    /// Anonymous caller with the given cultures
    pub fn anonymous<C: Into<String>, U: Into<String>>(culture: C, ui_culture: U) -> Self {
        Self::new(Principal::anonymous(), culture, ui_culture)
    }

    /// Replace the principal
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = principal;
        self
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::anonymous(INVARIANT_CULTURE, INVARIANT_CULTURE)
    }
}
