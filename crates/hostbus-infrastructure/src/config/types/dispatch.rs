//! Dispatch pipeline configuration types

use serde::{Deserialize, Serialize};

/// Dispatch pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Register the performance logging interceptor on every pipeline
    pub performance_logging: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            performance_logging: true,
        }
    }
}
