//! Service host event streaming endpoint
//!
//! Serves the host's bus to remote listeners: each call dispatches a
//! [`StreamBusEventsQuery`] in its own task and yields encoded event frames
//! until the caller goes away.

use crate::grpc::{ExecutionContextInterceptor, guarded};
use crate::status::to_status;
use crate::wire::encode_event;
use futures::Stream;
use hostbus_application::dispatch::{CallContext, QueryDispatcher};
use hostbus_application::handlers::StreamBusEventsQuery;
use hostbus_infrastructure::TimedOperation;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

/// Frame item sent to a remote listener
pub type EventFrame = Result<Vec<u8>, Status>;

/// Server side of the bus event stream
pub struct ServiceHost<D> {
    dispatcher: Arc<D>,
    interceptor: ExecutionContextInterceptor,
}

impl<D> ServiceHost<D>
where
    D: QueryDispatcher + 'static,
{
    /// Create an endpoint dispatching through `dispatcher`
    pub fn new(dispatcher: Arc<D>) -> Self {
        Self {
            dispatcher,
            interceptor: ExecutionContextInterceptor,
        }
    }

    /// Open an event stream for the calling listener
    ///
    /// Fails before subscribing when the execution context headers are
    /// invalid. Dropping the returned stream cancels the query.
    pub async fn stream_events(
        &self,
        request: Request<()>,
    ) -> Result<Response<EventFrameStream>, Status> {
        let mut interceptor = self.interceptor;
        let dispatcher = Arc::clone(&self.dispatcher);

        guarded(&mut interceptor, request, |execution, ()| async move {
            let cancel = CancellationToken::new();
            let (sender, receiver) = mpsc::unbounded_channel();

            let frames = sender.clone();
            let query = StreamBusEventsQuery::new(move |event| {
                if frames.send(Ok(encode_event(&event))).is_err() {
                    debug!(kind = event.kind(), "Event dropped, stream receiver gone");
                }
            });
            let call = CallContext::new(execution, cancel.clone());

            tokio::spawn(async move {
                let timer = TimedOperation::start();
                match dispatcher.query(query, call).await {
                    Ok(delivered) => info!(
                        delivered,
                        elapsed_ms = timer.elapsed_ms(),
                        "Event stream closed"
                    ),
                    Err(err) => {
                        warn!(error = %err, elapsed_ms = timer.elapsed_ms(), "Event stream failed");
                        // The receiver may already be gone
                        let _ = sender.send(Err(to_status(&err)));
                    }
                }
            });

            Ok(EventFrameStream {
                receiver,
                _cancel: cancel.drop_guard(),
            })
        })
        .await
    }
}

impl<D> std::fmt::Debug for ServiceHost<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHost").finish_non_exhaustive()
    }
}

/// Encoded event frames for one remote listener
///
/// Ends after the query stops; dropping it cancels the query.
pub struct EventFrameStream {
    receiver: mpsc::UnboundedReceiver<EventFrame>,
    _cancel: DropGuard,
}

impl Stream for EventFrameStream {
    type Item = EventFrame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl std::fmt::Debug for EventFrameStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFrameStream")
            .field("buffered", &self.receiver.len())
            .finish_non_exhaustive()
    }
}
