//! Application configuration root

use super::{DispatchConfig, EventBusConfig, ListenerConfig, LoggingConfig};
use serde::{Deserialize, Serialize};

/// Root configuration; every section falls back to its defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging subscriber settings
    pub logging: LoggingConfig,

    /// In-process event bus settings
    pub event_bus: EventBusConfig,

    /// Service host event listener settings
    pub listener: ListenerConfig,

    /// Dispatch pipeline settings
    pub dispatch: DispatchConfig,
}
