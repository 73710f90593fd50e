//! Service host listener configuration types

use crate::constants::LISTENER_RECONNECT_DELAY_MS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Service host event listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Delay between a stream failure and the next connection attempt
    pub reconnect_delay_ms: u64,
}

impl ListenerConfig {
    /// Reconnect delay as a duration
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: LISTENER_RECONNECT_DELAY_MS,
        }
    }
}
