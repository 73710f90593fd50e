//! Server Layer - hostbus
//!
//! The gRPC boundary of a service host process.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`grpc`] | Execution context propagation through call metadata |
//! | [`wire`] | Length-delimited protobuf event frames |
//! | [`status`] | Domain error to gRPC status translation, both directions |
//! | [`service_host`] | Event streaming endpoint serving the host bus |
//! | [`client`] | Remote query dispatcher carrying bus event streams from a host |
//! | [`constants`] | Metadata keys |
//!
//! Remote processes mirror a host's bus by handing a [`ServiceHostClient`]
//! to a `ServiceHostEventListener`, which reconnects and tracks liveness.
//! For a one-shot copy without reconnects, [`wire::event_source`] feeds an
//! event hub's `notify_many`.

pub mod client;
pub mod constants;
pub mod grpc;
pub mod service_host;
pub mod status;
pub mod wire;

pub use client::ServiceHostClient;
pub use grpc::{
    ExecutionContextInterceptor, guarded, read_execution_context, write_execution_context,
};
pub use service_host::{EventFrame, EventFrameStream, ServiceHost};
pub use status::{from_status, to_status};
pub use wire::{decode_event, encode_event, event_source};
