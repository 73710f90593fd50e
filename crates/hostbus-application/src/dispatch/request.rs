//! Request contracts
//!
//! Commands change state and yield no business value; queries read and
//! yield a typed result. Both travel through the same pipeline.

use std::fmt;
use std::sync::Arc;

/// Whether a request is a command or a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// State-changing request
    Command,
    /// Read request
    Query,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Query => f.write_str("query"),
        }
    }
}

/// A request dispatched through the pipeline
pub trait Request: Send + Sync + 'static {
    /// Value produced by the handler
    type Output: Send + 'static;

    /// Command or query
    const KIND: RequestKind;
}

/// State-changing request
pub trait Command: Request<Output = ()> {}

/// Read request
pub trait Query: Request {}

/// Callback a command handler invokes with the key it generated
///
/// Commands that create entities carry an optional `KeyCallback` so the
/// caller learns the new key without the command returning a value.
pub struct KeyCallback<K> {
    callback: Arc<dyn Fn(&K) + Send + Sync>,
}

impl<K> KeyCallback<K> {
    /// Wrap a callback
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&K) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Report the generated key
    pub fn invoke(&self, key: &K) {
        (self.callback)(key);
    }
}

impl<K> Clone for KeyCallback<K> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<K> fmt::Debug for KeyCallback<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyCallback")
    }
}

/// Short type name without module path, e.g. `CreateTenant`
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    let start = base.rfind("::").map_or(0, |idx| idx + 2);
    &full[start..]
}
