//! Command/Query Dispatch Pipeline
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Dispatcher`] | Resolves and runs the pipeline for a request type |
//! | [`Interceptor`] | Middleware stage wrapping handler execution |
//! | [`Handler`] | Terminal stage implementing one request |
//! | [`RequestContext`] | Per-invocation context seen by every stage |
//! | [`CallContext`] | Caller identity, cultures and cancellation |

/// Dispatch contexts and ambient services
pub mod context;
/// Dispatcher and builder
pub mod dispatcher;
/// Handler contract
pub mod handler;
/// Interceptor chain
pub mod interceptor;
/// Request contracts
pub mod request;

pub use context::{CallContext, RequestContext, ServiceProvider};
pub use dispatcher::{CommandDispatcher, Dispatcher, DispatcherBuilder, QueryDispatcher};
pub use handler::Handler;
pub use interceptor::{Erased, Interceptor, Next};
pub use request::{Command, KeyCallback, Query, Request, RequestKind, short_type_name};
