//! Event Ports
//!
//! Contracts for publishing events into a hub and observing them.
//!
//! ## Architecture
//!
//! Publishers depend on [`EventNotifier`], consumers on [`EventListener`].
//! The in-process bus implements both; the remote service host listener
//! implements only [`EventListener`]. Consumers either register an
//! [`EventObserver`] (synchronous push, in subscription order) or pull an
//! [`EventStream`].
//!
//! ## Usage
//!
//! ```no_run
//! use futures::StreamExt;
//! use hostbus_application::ports::EventListener;
//! use std::sync::Arc;
//!
//! async fn log_events(listener: Arc<dyn EventListener>) {
//!     let mut events = listener.listen();
//!     while let Some(event) = events.next().await {
//!         println!("received {}", event.kind());
//!     }
//! }
//! ```

use futures::Stream;
use futures::stream::BoxStream;
use hostbus_domain::error::{Error, Result};
use hostbus_domain::events::Event;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};
use tracing::warn;

/// Asynchronous source of events fed into a hub with `notify_many`
pub type EventSource = BoxStream<'static, Result<Event>>;

/// Callbacks invoked by a hub for each subscriber
///
/// Returning an error (or panicking) from any callback is contained by the
/// hub: it is logged and delivery continues with the next subscriber.
pub trait EventObserver: Send + Sync {
    /// Called once per event
    fn on_next(&self, event: &Event) -> Result<()>;

    /// Called when the hub reports an error to its subscribers
    fn on_error(&self, _error: &Error) -> Result<()> {
        Ok(())
    }

    /// Called once when the hub completes
    fn on_completed(&self) -> Result<()> {
        Ok(())
    }
}

/// Publishing side of an event hub
pub trait EventNotifier: Send + Sync {
    /// Push `event` to every current subscriber; never fails
    fn notify(&self, event: Event);

    /// Forward every event of `source` into the hub until the returned
    /// subscription is disposed or the source ends
    fn notify_many(&self, source: EventSource) -> Subscription;
}

/// Consuming side of an event hub
pub trait EventListener: Send + Sync {
    /// Liveness signal of the hub's upstream
    fn is_active(&self) -> watch::Receiver<bool>;

    /// Register an observer; events flow until the subscription is disposed
    fn subscribe(&self, observer: Arc<dyn EventObserver>) -> Subscription;

    /// Pull-based view of the hub; dropping the stream unsubscribes
    fn listen(&self) -> EventStream {
        EventStream::attach(|observer| self.subscribe(observer))
    }
}

/// Disposable handle returned by subscriptions
///
/// Disposing (or dropping) the handle runs its teardown exactly once.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Create a subscription that runs `teardown` when disposed
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Subscription with nothing to tear down
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// Tear down now
    pub fn dispose(mut self) {
        self.run_teardown();
    }

    /// Keep the subscription alive for the lifetime of the hub
    pub fn detach(mut self) {
        self.teardown = None;
    }

    fn run_teardown(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_teardown();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.teardown.is_some())
            .finish()
    }
}

/// Observer built from a closure
pub struct ObserverFn<F> {
    on_next: F,
}

impl<F> ObserverFn<F>
where
    F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
{
    /// Wrap `on_next` as a shareable observer
    pub fn shared(on_next: F) -> Arc<dyn EventObserver> {
        Arc::new(Self { on_next })
    }
}

impl<F> EventObserver for ObserverFn<F>
where
    F: Fn(&Event) -> Result<()> + Send + Sync,
{
    fn on_next(&self, event: &Event) -> Result<()> {
        (self.on_next)(event)
    }
}

/// Observer forwarding into the channel behind an [`EventStream`]
struct ChannelObserver {
    sender: Mutex<Option<mpsc::UnboundedSender<Event>>>,
}

impl ChannelObserver {
    fn sender(&self) -> Result<Option<mpsc::UnboundedSender<Event>>> {
        self.sender
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| Error::internal("event stream sender lock poisoned"))
    }
}

impl EventObserver for ChannelObserver {
    fn on_next(&self, event: &Event) -> Result<()> {
        if let Some(sender) = self.sender()? {
            // A closed receiver means the stream was dropped and is unsubscribing.
            let _ = sender.send(event.clone());
        }
        Ok(())
    }

    fn on_completed(&self) -> Result<()> {
        self.sender
            .lock()
            .map(|mut guard| {
                guard.take();
            })
            .map_err(|_| Error::internal("event stream sender lock poisoned"))
    }
}

/// Stream of events pulled from a hub
///
/// Ends when the hub completes. Dropping it unsubscribes.
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<Event>,
    buffer_warn: Option<usize>,
    lagging: bool,
    _subscription: Subscription,
}

impl EventStream {
    /// Create a stream by registering a channel observer through `subscribe`
    pub fn attach<S>(subscribe: S) -> Self
    where
        S: FnOnce(Arc<dyn EventObserver>) -> Subscription,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let observer = Arc::new(ChannelObserver {
            sender: Mutex::new(Some(sender)),
        });
        let subscription = subscribe(observer);
        Self {
            receiver,
            buffer_warn: None,
            lagging: false,
            _subscription: subscription,
        }
    }

    /// Warn once each time more than `threshold` events wait unread
    pub fn warn_when_buffered(mut self, threshold: usize) -> Self {
        self.buffer_warn = Some(threshold);
        self
    }

    /// Events delivered but not yet pulled
    pub fn buffered(&self) -> usize {
        self.receiver.len()
    }

    fn track_lag(&mut self) {
        let Some(threshold) = self.buffer_warn else {
            return;
        };
        let buffered = self.receiver.len();
        if buffered > threshold && !self.lagging {
            warn!(buffered, threshold, "Event stream consumer is lagging");
            self.lagging = true;
        } else if buffered <= threshold {
            self.lagging = false;
        }
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.track_lag();
        self.receiver.poll_recv(cx)
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("buffered", &self.receiver.len())
            .finish_non_exhaustive()
    }
}
