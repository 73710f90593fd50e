//! Bus event streaming query
//!
//! [`StreamBusEventsQuery`] is a long-lived query: while the connection is
//! healthy its dispatch never returns. The handler forwards every bus event
//! to the query's callback and completes only when the call is cancelled
//! (or the bus completes), returning the number of events delivered.

use crate::dispatch::{Handler, Query, Request, RequestContext, RequestKind};
use crate::ports::{EventListener, EventObserver};
use async_trait::async_trait;
use hostbus_domain::error::Result;
use hostbus_domain::events::Event;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Callback invoked once per streamed event
pub type EventCallback = Arc<dyn Fn(Event) + Send + Sync>;

/// Stream bus events to `on_event` until cancelled
#[derive(Clone)]
pub struct StreamBusEventsQuery {
    on_event: EventCallback,
}

impl StreamBusEventsQuery {
    /// Create the query with its per-event callback
    pub fn new<F>(on_event: F) -> Self
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        Self {
            on_event: Arc::new(on_event),
        }
    }

    /// Hand one event to the callback
    pub fn deliver(&self, event: Event) {
        (self.on_event)(event);
    }
}

impl fmt::Debug for StreamBusEventsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBusEventsQuery").finish_non_exhaustive()
    }
}

impl Request for StreamBusEventsQuery {
    type Output = u64;
    const KIND: RequestKind = RequestKind::Query;
}

impl Query for StreamBusEventsQuery {}

struct ForwardingObserver {
    on_event: EventCallback,
    delivered: Arc<AtomicU64>,
    completed: CancellationToken,
}

impl EventObserver for ForwardingObserver {
    fn on_next(&self, event: &Event) -> Result<()> {
        (self.on_event)(event.clone());
        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn on_completed(&self) -> Result<()> {
        self.completed.cancel();
        Ok(())
    }
}

/// Handler streaming events from a local hub
pub struct StreamBusEventsQueryHandler {
    listener: Arc<dyn EventListener>,
}

impl StreamBusEventsQueryHandler {
    /// Stream events observed on `listener`
    pub fn new(listener: Arc<dyn EventListener>) -> Self {
        Self { listener }
    }
}

#[async_trait]
impl Handler<StreamBusEventsQuery> for StreamBusEventsQueryHandler {
    async fn handle(
        &self,
        query: &StreamBusEventsQuery,
        ctx: &RequestContext<'_>,
    ) -> Result<u64> {
        let cancellation = ctx.cancellation();
        if cancellation.is_cancelled() {
            debug!("Bus event stream cancelled before it started");
            return Ok(0);
        }

        let delivered = Arc::new(AtomicU64::new(0));
        let completed = CancellationToken::new();
        let subscription = self.listener.subscribe(Arc::new(ForwardingObserver {
            on_event: Arc::clone(&query.on_event),
            delivered: Arc::clone(&delivered),
            completed: completed.clone(),
        }));
        query.deliver(Event::StreamInit);
        debug!("Bus event stream established");

        tokio::select! {
            () = cancellation.cancelled() => debug!("Bus event stream cancelled"),
            () = completed.cancelled() => debug!("Bus completed, ending event stream"),
        }

        subscription.dispose();
        Ok(delivered.load(Ordering::Relaxed))
    }
}
