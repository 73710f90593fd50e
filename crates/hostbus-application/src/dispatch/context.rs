//! Dispatch contexts
//!
//! [`CallContext`] is supplied by the caller (identity, cultures,
//! cancellation). [`RequestContext`] is built by the dispatcher for one
//! invocation and handed to every interceptor and the handler.

use super::request::RequestKind;
use hostbus_domain::error::{Error, Result};
use hostbus_domain::value_objects::ExecutionContext;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Caller-supplied per-call state
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Caller identity and cultures
    pub execution: ExecutionContext,
    /// Cancellation signal for the call
    pub cancellation: CancellationToken,
}

impl CallContext {
    /// Create a call context
    pub fn new(execution: ExecutionContext, cancellation: CancellationToken) -> Self {
        Self {
            execution,
            cancellation,
        }
    }

    /// Replace the cancellation token
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Whether the call has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Type-keyed resolver for ambient services
///
/// Services are registered once when the dispatcher is built and are
/// resolved by handlers through their [`RequestContext`].
#[derive(Clone, Default)]
pub struct ServiceProvider {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service`, replacing any previous value of the same type
    pub fn insert<T: Send + Sync + 'static>(&mut self, service: T) {
        self.services.insert(TypeId::of::<T>(), Arc::new(service));
    }

    /// Resolve a service
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|service| service.downcast_ref::<T>())
            .cloned()
    }

    /// Resolve a service that must be registered
    pub fn require<T: Clone + 'static>(&self) -> Result<T> {
        self.get::<T>().ok_or_else(|| {
            Error::internal(format!("service not registered: {}", type_name::<T>()))
        })
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether no service is registered
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.services.len())
            .finish()
    }
}

/// Per-invocation context
pub struct RequestContext<'a> {
    request: &'a (dyn Any + Send + Sync),
    request_type: &'static str,
    kind: RequestKind,
    services: &'a ServiceProvider,
    call: &'a CallContext,
}

impl<'a> RequestContext<'a> {
    /// Build a context for one invocation
    pub fn new(
        request: &'a (dyn Any + Send + Sync),
        request_type: &'static str,
        kind: RequestKind,
        services: &'a ServiceProvider,
        call: &'a CallContext,
    ) -> Self {
        Self {
            request,
            request_type,
            kind,
            services,
            call,
        }
    }

    /// The request, if it is of type `R`
    pub fn request<R: 'static>(&self) -> Option<&'a R> {
        self.request.downcast_ref::<R>()
    }

    /// Short name of the request type
    pub fn request_type(&self) -> &'static str {
        self.request_type
    }

    /// Command or query
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Ambient service resolver
    pub fn services(&self) -> &'a ServiceProvider {
        self.services
    }

    /// Caller identity and cultures
    pub fn execution(&self) -> &'a ExecutionContext {
        &self.call.execution
    }

    /// Cancellation signal for the call
    pub fn cancellation(&self) -> &'a CancellationToken {
        &self.call.cancellation
    }

    /// The whole caller-supplied context
    pub fn call(&self) -> &'a CallContext {
        self.call
    }
}

impl fmt::Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_type", &self.request_type)
            .field("kind", &self.kind)
            .field("execution", &self.call.execution)
            .finish_non_exhaustive()
    }
}
