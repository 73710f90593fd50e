//! Request handlers
//!
//! A handler is the terminal stage of a pipeline. The dispatcher stores
//! handlers behind a type-erased adapter so pipelines for different request
//! types share one interceptor contract.

use super::context::RequestContext;
use super::interceptor::Erased;
use super::request::Request;
use async_trait::async_trait;
use hostbus_domain::error::{Error, Result};
use std::marker::PhantomData;

/// Business logic for a single request type
#[async_trait]
pub trait Handler<R: Request>: Send + Sync {
    /// Handle `request`
    async fn handle(&self, request: &R, ctx: &RequestContext<'_>) -> Result<R::Output>;
}

#[async_trait]
pub(crate) trait ErasedHandler: Send + Sync {
    async fn invoke(&self, ctx: &RequestContext<'_>) -> Result<Erased>;
}

pub(crate) struct HandlerAdapter<R, H> {
    handler: H,
    _request: PhantomData<fn() -> R>,
}

impl<R, H> HandlerAdapter<R, H> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _request: PhantomData,
        }
    }
}

#[async_trait]
impl<R, H> ErasedHandler for HandlerAdapter<R, H>
where
    R: Request,
    H: Handler<R>,
{
    async fn invoke(&self, ctx: &RequestContext<'_>) -> Result<Erased> {
        let request = ctx.request::<R>().ok_or_else(|| {
            Error::internal(format!(
                "request type mismatch in pipeline for {}",
                ctx.request_type()
            ))
        })?;
        let output = self.handler.handle(request, ctx).await?;
        Ok(Box::new(output))
    }
}
