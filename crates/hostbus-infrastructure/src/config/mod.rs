//! Configuration
//!
//! Layered configuration (defaults, TOML file, `HOSTBUS__` environment
//! variables) loaded through Figment.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::*;
