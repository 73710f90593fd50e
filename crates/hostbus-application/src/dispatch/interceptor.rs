//! Interceptor chain
//!
//! Interceptors wrap handler execution with cross-cutting behavior. Each
//! one receives the request context and a [`Next`] continuation; it may run
//! logic before and after `next.run(ctx)`, skip the call entirely, or map
//! the result.
//!
//! ```text
//!  dispatch ──► A.intercept ──► B.intercept ──► handler
//!                   ▲                │
//!                   └──── result ◄───┘
//! ```

use super::context::RequestContext;
use super::handler::ErasedHandler;
use async_trait::async_trait;
use hostbus_domain::error::Result;
use std::any::Any;
use std::sync::Arc;

/// Type-erased handler output passed back through the chain
pub type Erased = Box<dyn Any + Send>;

/// Middleware stage wrapping handler execution
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Run this stage; call `next.run(ctx)` to continue the chain
    async fn intercept(&self, ctx: &RequestContext<'_>, next: Next<'_>) -> Result<Erased>;
}

/// Remainder of the chain after the current interceptor
#[derive(Clone, Copy)]
pub struct Next<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    terminal: &'a dyn ErasedHandler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        interceptors: &'a [Arc<dyn Interceptor>],
        terminal: &'a dyn ErasedHandler,
    ) -> Self {
        Self {
            interceptors,
            terminal,
        }
    }

    /// Continue with the next interceptor, or the handler when none is left
    pub async fn run(self, ctx: &RequestContext<'_>) -> Result<Erased> {
        match self.interceptors.split_first() {
            Some((current, rest)) => {
                current
                    .intercept(ctx, Next::new(rest, self.terminal))
                    .await
            }
            None => self.terminal.invoke(ctx).await,
        }
    }

    /// Number of interceptors still ahead of the handler
    pub fn remaining(&self) -> usize {
        self.interceptors.len()
    }
}
