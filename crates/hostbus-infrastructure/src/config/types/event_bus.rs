//! EventBus configuration types

use crate::constants::EVENT_STREAM_BUFFER_WARN;
use serde::{Deserialize, Serialize};

/// EventBus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Unread events a pull-based stream may buffer before a lag warning is logged
    pub stream_buffer_warn: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            stream_buffer_warn: EVENT_STREAM_BUFFER_WARN,
        }
    }
}
