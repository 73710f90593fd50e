//! Configuration types module

pub mod app;
pub mod dispatch;
pub mod event_bus;
pub mod listener;
pub mod logging;

// Re-export main types
pub use app::AppConfig;
pub use dispatch::DispatchConfig;
pub use event_bus::EventBusConfig;
pub use listener::ListenerConfig;
pub use logging::LoggingConfig;
