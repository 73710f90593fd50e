//! Service host event listener
//!
//! Mirrors the event stream of a (usually remote) service host. The first
//! subscription starts a single connection loop that dispatches
//! [`StreamBusEventsQuery`] and republishes every received event on an
//! internal hub. The stream is long-lived: it only ends on cancellation, so
//! a normal return is treated as a protocol violation. Any failure flips
//! [`EventListener::is_active`] to `false` and the loop reconnects after a
//! fixed delay, forever, until the listener is dropped.

use super::bus::EventBus;
use crate::constants::LISTENER_RECONNECT_DELAY_MS;
use hostbus_application::dispatch::{CallContext, QueryDispatcher};
use hostbus_application::handlers::StreamBusEventsQuery;
use hostbus_application::ports::{EventListener, EventObserver, Subscription};
use hostbus_domain::error::Error;
use hostbus_domain::events::Event;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

struct Inner<D> {
    dispatcher: Arc<D>,
    reconnect_delay: Duration,
    hub: EventBus,
    active: watch::Sender<bool>,
    started: AtomicBool,
    shutdown: CancellationToken,
    last_error: Mutex<Option<String>>,
}

impl<D> Inner<D>
where
    D: QueryDispatcher + 'static,
{
    async fn run(self: Arc<Self>) {
        info!("Service host event listener started");
        loop {
            let call = CallContext::default().with_cancellation(self.shutdown.child_token());
            let forward = Arc::clone(&self);
            let query = StreamBusEventsQuery::new(move |event| forward.on_event(event));

            let outcome = tokio::select! {
                () = self.shutdown.cancelled() => break,
                outcome = self.dispatcher.query(query, call) => outcome,
            };
            if self.shutdown.is_cancelled() {
                break;
            }

            let error = match outcome {
                Ok(delivered) => Error::protocol(format!(
                    "service host event stream ended after {delivered} events without cancellation"
                )),
                Err(err) => err,
            };
            self.on_stream_error(&error);

            tokio::select! {
                () = self.shutdown.cancelled() => break,
                () = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
        self.hub.complete();
        info!("Service host event listener stopped");
    }

    fn on_event(&self, event: Event) {
        if self.active.send_if_modified(|active| !std::mem::replace(active, true)) {
            info!("Service host event stream restored");
        }
        // StreamInit alone does not prove the connection is healthy
        if !event.is_stream_init() {
            self.last_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
        }
        self.hub.notify(event);
    }

    fn on_stream_error(&self, error: &Error) {
        self.active
            .send_if_modified(|active| std::mem::replace(active, false));

        let message = error.to_string();
        let mut last_error = self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last_error.as_deref() == Some(message.as_str()) {
            debug!(error = %message, "Service host event stream still failing");
            return;
        }
        if error.is_transient() {
            warn!(
                error = %message,
                retry_in = ?self.reconnect_delay,
                "Service host event stream failed"
            );
        } else {
            error!(
                error = %message,
                retry_in = ?self.reconnect_delay,
                "Service host event stream failed"
            );
        }
        *last_error = Some(message);
    }
}

/// Listener mirroring a service host's event stream
///
/// Share it behind an `Arc`; dropping the last handle stops the connection
/// loop and completes every subscriber.
pub struct ServiceHostEventListener<D> {
    inner: Arc<Inner<D>>,
}

impl<D> ServiceHostEventListener<D>
where
    D: QueryDispatcher + 'static,
{
    /// Create a listener; the connection starts with the first subscription
    ///
    /// `reconnect_delay` defaults to 500 ms.
    pub fn new(dispatcher: Arc<D>, reconnect_delay: Option<Duration>) -> Self {
        let (active, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                dispatcher,
                reconnect_delay: reconnect_delay
                    .unwrap_or(Duration::from_millis(LISTENER_RECONNECT_DELAY_MS)),
                hub: EventBus::new(),
                active,
                started: AtomicBool::new(false),
                shutdown: CancellationToken::new(),
                last_error: Mutex::new(None),
            }),
        }
    }

    /// Delay between a failure and the next connection attempt
    pub fn reconnect_delay(&self) -> Duration {
        self.inner.reconnect_delay
    }

    /// Whether the connection loop has been started
    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    /// Stop the connection loop and complete every subscriber
    pub fn dispose(self) {
        drop(self);
    }

    fn ensure_started(&self) {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return;
        }
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(Arc::clone(&self.inner).run());
            }
            Err(err) => {
                self.inner.started.store(false, Ordering::Release);
                error!(error = %err, "Service host event listener needs a tokio runtime to start");
            }
        }
    }
}

impl<D> EventListener for ServiceHostEventListener<D>
where
    D: QueryDispatcher + 'static,
{
    fn is_active(&self) -> watch::Receiver<bool> {
        self.inner.active.subscribe()
    }

    fn subscribe(&self, observer: Arc<dyn EventObserver>) -> Subscription {
        let subscription = self.inner.hub.subscribe(observer);
        self.ensure_started();
        subscription
    }
}

impl<D> Drop for ServiceHostEventListener<D> {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
        if !self.inner.started.load(Ordering::Acquire) {
            self.inner.hub.complete();
        }
    }
}

impl<D> std::fmt::Debug for ServiceHostEventListener<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHostEventListener")
            .field("reconnect_delay", &self.inner.reconnect_delay)
            .field("active", &*self.inner.active.borrow())
            .field("started", &self.inner.started.load(Ordering::Acquire))
            .field("hub", &self.inner.hub)
            .finish()
    }
}
