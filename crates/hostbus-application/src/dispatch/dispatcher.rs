//! Command/Query Dispatcher
//!
//! Resolves the pipeline registered for a request's type and runs it.
//! Pipelines are composed once in [`DispatcherBuilder::build`]; dispatching
//! never re-resolves interceptors.
//!
//! ## Usage
//!
//! ```ignore
//! let dispatcher = Dispatcher::builder()
//!     .interceptor(Arc::new(PerformanceLoggingInterceptor::new(guids)))
//!     .command_handler::<CreateTenant, _>(CreateTenantHandler::new(repo))
//!     .query_handler::<GetTenant, _>(GetTenantHandler::new(repo))
//!     .build();
//!
//! dispatcher.dispatch_command(CreateTenant { name }, &CallContext::default()).await?;
//! ```

use super::context::{CallContext, RequestContext, ServiceProvider};
use super::handler::{ErasedHandler, Handler, HandlerAdapter};
use super::interceptor::{Interceptor, Next};
use super::request::{Command, Query, Request, RequestKind, short_type_name};
use async_trait::async_trait;
use hostbus_domain::error::{Error, Result};
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Executes commands
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    /// Run `command` through its pipeline
    async fn execute<C: Command>(&self, command: C, call: CallContext) -> Result<()>;
}

/// Executes queries
#[async_trait]
pub trait QueryDispatcher: Send + Sync {
    /// Run `query` through its pipeline
    async fn query<Q: Query>(&self, query: Q, call: CallContext) -> Result<Q::Output>;
}

/// Composed pipeline for one request type
struct Pipeline {
    request_type: &'static str,
    kind: RequestKind,
    interceptors: Arc<[Arc<dyn Interceptor>]>,
    handler: Box<dyn ErasedHandler>,
}

struct Registration {
    request_type: &'static str,
    kind: RequestKind,
    handler: Box<dyn ErasedHandler>,
}

/// In-process command/query dispatcher
pub struct Dispatcher {
    pipelines: HashMap<TypeId, Pipeline>,
    services: ServiceProvider,
}

impl Dispatcher {
    /// Start configuring a dispatcher
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Dispatch a command
    pub async fn dispatch_command<C: Command>(&self, command: C, call: &CallContext) -> Result<()> {
        self.dispatch(command, call).await
    }

    /// Dispatch a query
    pub async fn dispatch_query<Q: Query>(
        &self,
        query: Q,
        call: &CallContext,
    ) -> Result<Q::Output> {
        self.dispatch(query, call).await
    }

    /// Whether a handler is registered for `R`
    pub fn handles<R: Request>(&self) -> bool {
        self.pipelines.contains_key(&TypeId::of::<R>())
    }

    /// Ambient services exposed to handlers
    pub fn services(&self) -> &ServiceProvider {
        &self.services
    }

    async fn dispatch<R: Request>(&self, request: R, call: &CallContext) -> Result<R::Output> {
        let Some(pipeline) = self.pipelines.get(&TypeId::of::<R>()) else {
            warn!(request_type = type_name::<R>(), "No handler registered");
            return Err(Error::handler_not_found(type_name::<R>()));
        };

        let ctx = RequestContext::new(
            &request,
            pipeline.request_type,
            pipeline.kind,
            &self.services,
            call,
        );
        let output = Next::new(&pipeline.interceptors, pipeline.handler.as_ref())
            .run(&ctx)
            .await?;

        output.downcast::<R::Output>().map(|boxed| *boxed).map_err(|_| {
            Error::internal(format!(
                "pipeline for {} produced a value of the wrong type",
                pipeline.request_type
            ))
        })
    }
}

#[async_trait]
impl CommandDispatcher for Dispatcher {
    async fn execute<C: Command>(&self, command: C, call: CallContext) -> Result<()> {
        self.dispatch_command(command, &call).await
    }
}

#[async_trait]
impl QueryDispatcher for Dispatcher {
    async fn query<Q: Query>(&self, query: Q, call: CallContext) -> Result<Q::Output> {
        self.dispatch_query(query, &call).await
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut request_types: Vec<&str> =
            self.pipelines.values().map(|p| p.request_type).collect();
        request_types.sort_unstable();
        f.debug_struct("Dispatcher")
            .field("request_types", &request_types)
            .field("services", &self.services)
            .finish()
    }
}

/// Builder composing interceptor chains and handlers
#[derive(Default)]
pub struct DispatcherBuilder {
    interceptors: Vec<Arc<dyn Interceptor>>,
    scoped: HashMap<TypeId, Vec<Arc<dyn Interceptor>>>,
    registrations: HashMap<TypeId, Registration>,
    services: ServiceProvider,
}

impl DispatcherBuilder {
    /// Append an interceptor applied to every request
    ///
    /// Interceptors run in registration order: the first one is outermost.
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Append an interceptor applied only to requests of type `R`
    ///
    /// Scoped interceptors run inside the global ones.
    pub fn scoped_interceptor<R: Request>(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.scoped
            .entry(TypeId::of::<R>())
            .or_default()
            .push(interceptor);
        self
    }

    /// Register the handler for command `C`
    pub fn command_handler<C, H>(self, handler: H) -> Self
    where
        C: Command,
        H: Handler<C> + 'static,
    {
        self.register::<C, H>(handler)
    }

    /// Register the handler for query `Q`
    pub fn query_handler<Q, H>(self, handler: H) -> Self
    where
        Q: Query,
        H: Handler<Q> + 'static,
    {
        self.register::<Q, H>(handler)
    }

    /// Register an ambient service resolvable through the request context
    pub fn service<T: Send + Sync + 'static>(mut self, service: T) -> Self {
        self.services.insert(service);
        self
    }

    /// Compose every pipeline
    pub fn build(mut self) -> Dispatcher {
        let pipelines = self
            .registrations
            .into_iter()
            .map(|(type_id, registration)| {
                let mut chain = self.interceptors.clone();
                if let Some(scoped) = self.scoped.remove(&type_id) {
                    chain.extend(scoped);
                }
                debug!(
                    request_type = registration.request_type,
                    kind = %registration.kind,
                    interceptors = chain.len(),
                    "Pipeline composed"
                );
                let pipeline = Pipeline {
                    request_type: registration.request_type,
                    kind: registration.kind,
                    interceptors: chain.into(),
                    handler: registration.handler,
                };
                (type_id, pipeline)
            })
            .collect();

        for type_id in self.scoped.keys() {
            warn!(?type_id, "Scoped interceptor registered for a request type without handler");
        }

        Dispatcher {
            pipelines,
            services: self.services,
        }
    }

    fn register<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: Handler<R> + 'static,
    {
        let registration = Registration {
            request_type: short_type_name(type_name::<R>()),
            kind: R::KIND,
            handler: Box::new(HandlerAdapter::<R, H>::new(handler)),
        };
        if self
            .registrations
            .insert(TypeId::of::<R>(), registration)
            .is_some()
        {
            warn!(
                request_type = type_name::<R>(),
                "Handler replaced by a later registration"
            );
        }
        self
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut request_types: Vec<&str> = self
            .registrations
            .values()
            .map(|r| r.request_type)
            .collect();
        request_types.sort_unstable();
        f.debug_struct("DispatcherBuilder")
            .field("interceptors", &self.interceptors.len())
            .field("request_types", &request_types)
            .field("services", &self.services)
            .finish()
    }
}
