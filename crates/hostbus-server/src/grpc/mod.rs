//! gRPC boundary helpers

pub mod context;

pub use context::{
    ExecutionContextInterceptor, execution_context, guarded, read_execution_context,
    write_execution_context,
};
