//! Infrastructure layer constants
//!
//! Contains constants that are part of the infrastructure implementation.
//! Domain-specific constants are defined in `hostbus_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "hostbus.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "hostbus";

/// Environment variable prefix for configuration (`HOSTBUS__SECTION__KEY`)
pub const CONFIG_ENV_PREFIX: &str = "HOSTBUS";

/// Separator between nested keys in configuration environment variables
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Environment variable overriding the configured log filter
pub const LOG_ENV_FILTER: &str = "HOSTBUS_LOG";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log file name stem for the rolling appender
pub const LOG_FILE_STEM: &str = "hostbus";

// ============================================================================
// EVENTING CONSTANTS
// ============================================================================

/// Delay before the service host listener reconnects after a failure (ms)
pub const LISTENER_RECONNECT_DELAY_MS: u64 = 500;

/// Buffered stream length above which a pull-based listener is reported as lagging
pub const EVENT_STREAM_BUFFER_WARN: usize = 1024;
