//! Dispatch interceptors

mod performance;

pub use performance::{Outcome, PerformanceLoggingInterceptor};
