//! Service host client
//!
//! [`ServiceHostClient`] is a [`QueryDispatcher`] that carries
//! [`StreamBusEventsQuery`] to a remote service host, so a
//! `ServiceHostEventListener` can mirror the host's bus across processes.
//! The transport is a connect function returning the host's frame stream;
//! with generated `tonic` clients it is a thin closure over the stub.

use crate::grpc::write_execution_context;
use crate::service_host::EventFrame;
use crate::status::from_status;
use crate::wire::decode_event;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Stream, StreamExt};
use hostbus_application::dispatch::{CallContext, Query, QueryDispatcher, short_type_name};
use hostbus_application::handlers::StreamBusEventsQuery;
use hostbus_domain::error::{Error, Result};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use tonic::{Request, Status};
use tracing::{debug, warn};

type FrameStream = BoxStream<'static, EventFrame>;

type Connect = Arc<
    dyn Fn(Request<()>) -> BoxFuture<'static, std::result::Result<FrameStream, Status>>
        + Send
        + Sync,
>;

/// Remote query dispatcher for a service host's event stream
///
/// Only [`StreamBusEventsQuery`] is carried; any other query fails with
/// [`Error::HandlerNotFound`].
#[derive(Clone)]
pub struct ServiceHostClient {
    connect: Connect,
}

impl ServiceHostClient {
    /// Create a client opening event streams through `connect`
    ///
    /// `connect` receives a request already carrying the caller's execution
    /// context headers.
    pub fn new<F, Fut, S>(connect: F) -> Self
    where
        F: Fn(Request<()>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<S, Status>> + Send + 'static,
        S: Stream<Item = EventFrame> + Send + 'static,
    {
        let connect: Connect = Arc::new(move |request| {
            let opened = connect(request);
            async move { opened.await.map(StreamExt::boxed) }.boxed()
        });
        Self { connect }
    }

    async fn stream_bus_events(
        &self,
        query: &StreamBusEventsQuery,
        call: &CallContext,
    ) -> Result<u64> {
        if call.is_cancelled() {
            return Ok(0);
        }

        let mut request = Request::new(());
        write_execution_context(&call.execution, request.metadata_mut())?;

        let mut frames = tokio::select! {
            () = call.cancellation.cancelled() => return Ok(0),
            opened = (self.connect)(request) => opened.map_err(|status| from_status(&status))?,
        };
        debug!("Service host event stream opened");

        let mut delivered = 0;
        loop {
            let frame = tokio::select! {
                () = call.cancellation.cancelled() => break,
                frame = frames.next() => frame,
            };
            match frame {
                Some(Ok(bytes)) => {
                    let event = decode_event(&bytes)?;
                    if !event.is_stream_init() {
                        delivered += 1;
                    }
                    query.deliver(event);
                }
                Some(Err(status)) => return Err(from_status(&status)),
                None => break,
            }
        }
        Ok(delivered)
    }
}

#[async_trait]
impl QueryDispatcher for ServiceHostClient {
    async fn query<Q: Query>(&self, query: Q, call: CallContext) -> Result<Q::Output> {
        let request_type = short_type_name(std::any::type_name::<Q>());
        let erased: &(dyn Any + Send + Sync) = &query;
        let Some(stream_query) = erased.downcast_ref::<StreamBusEventsQuery>() else {
            warn!(request_type, "Query is not served by a service host client");
            return Err(Error::handler_not_found(request_type));
        };

        let delivered = self.stream_bus_events(stream_query, &call).await?;
        let output: Box<dyn Any + Send> = Box::new(delivered);
        output
            .downcast::<Q::Output>()
            .map(|output| *output)
            .map_err(|_| Error::internal(format!("{request_type} output is not an event count")))
    }
}

impl std::fmt::Debug for ServiceHostClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHostClient").finish_non_exhaustive()
    }
}
