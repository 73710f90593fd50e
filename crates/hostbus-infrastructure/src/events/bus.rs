//! In-process event bus
//!
//! Synchronous push hub: [`EventBus::notify`] walks a snapshot of the
//! subscriber list in subscription order and calls each observer on the
//! notifying task. Observer failures (errors and panics) are contained per
//! callback, logged, and never reach the notifier.

use futures::StreamExt;
use hostbus_application::ports::{
    EventListener, EventNotifier, EventObserver, EventSource, EventStream, Subscription,
};
use hostbus_domain::error::Error;
use hostbus_domain::events::Event;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, trace};

type Observers = Vec<(u64, Arc<dyn EventObserver>)>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    observers: Observers,
    completed: bool,
}

struct Shared {
    subscribers: RwLock<Subscribers>,
    active: watch::Sender<bool>,
    stream_buffer_warn: Option<usize>,
}

impl Shared {
    fn snapshot(&self) -> Option<Observers> {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if subscribers.completed {
            None
        } else {
            Some(subscribers.observers.clone())
        }
    }

    fn notify(&self, event: &Event) {
        let Some(observers) = self.snapshot() else {
            trace!(event = event.kind(), "Event dropped, bus already completed");
            return;
        };
        for (_, observer) in observers {
            deliver("on_next", || observer.on_next(event));
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .observers
            .retain(|(existing, _)| *existing != id);
    }

    fn complete(&self) {
        let observers = {
            let mut subscribers = self
                .subscribers
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if subscribers.completed {
                return;
            }
            subscribers.completed = true;
            std::mem::take(&mut subscribers.observers)
        };
        debug!(subscribers = observers.len(), "Event bus completed");
        for (_, observer) in observers {
            deliver("on_completed", || observer.on_completed());
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.complete();
    }
}

/// Run one observer callback, containing its error or panic
fn deliver<F>(callback: &'static str, invoke: F)
where
    F: FnOnce() -> hostbus_domain::error::Result<()>,
{
    match catch_unwind(AssertUnwindSafe(invoke)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(error = %err, "Error occurred in a listener's {callback} handler.");
        }
        Err(panic) => {
            error!(
                panic = panic_message(panic.as_ref()),
                "Error occurred in a listener's {callback} handler."
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Process-local event hub
///
/// Cloning yields another handle to the same hub. The hub completes when
/// [`EventBus::complete`] is called or the last handle is dropped.
#[derive(Clone)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create an empty, active bus
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a bus whose pull streams warn once `threshold` unread events pile up
    pub fn with_stream_buffer_warn(threshold: usize) -> Self {
        Self::build(Some(threshold))
    }

    fn build(stream_buffer_warn: Option<usize>) -> Self {
        let (active, _) = watch::channel(true);
        Self {
            shared: Arc::new(Shared {
                subscribers: RwLock::new(Subscribers::default()),
                active,
                stream_buffer_warn,
            }),
        }
    }

    /// Deliver `event` to every current subscriber, in subscription order
    pub fn notify(&self, event: Event) {
        self.shared.notify(&event);
    }

    /// Report `error` to every current subscriber without completing the bus
    pub fn notify_error(&self, error: &Error) {
        let Some(observers) = self.shared.snapshot() else {
            return;
        };
        for (_, observer) in observers {
            deliver("on_error", || observer.on_error(error));
        }
    }

    /// Complete every subscriber and reject later subscriptions
    pub fn complete(&self) {
        self.shared.complete();
    }

    /// Whether [`EventBus::complete`] has run
    pub fn is_completed(&self) -> bool {
        self.shared
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .completed
    }

    /// Number of registered observers
    pub fn subscriber_count(&self) -> usize {
        self.shared
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .observers
            .len()
    }
}

impl EventNotifier for EventBus {
    fn notify(&self, event: Event) {
        EventBus::notify(self, event);
    }

    fn notify_many(&self, mut source: EventSource) -> Subscription {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                error!(error = %err, "Event source forwarding needs a tokio runtime");
                return Subscription::empty();
            }
        };
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let forwarder = runtime.spawn(async move {
            while let Some(item) = source.next().await {
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                match item {
                    Ok(event) => shared.notify(&event),
                    Err(err) => {
                        error!(error = %err, "Event source failed");
                        return;
                    }
                }
            }
            debug!("Event source exhausted");
        });
        let abort = forwarder.abort_handle();
        Subscription::new(move || abort.abort())
    }
}

impl EventListener for EventBus {
    fn is_active(&self) -> watch::Receiver<bool> {
        self.shared.active.subscribe()
    }

    fn subscribe(&self, observer: Arc<dyn EventObserver>) -> Subscription {
        let id = {
            let mut subscribers = self
                .shared
                .subscribers
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if subscribers.completed {
                None
            } else {
                let id = subscribers.next_id;
                subscribers.next_id += 1;
                subscribers.observers.push((id, Arc::clone(&observer)));
                Some(id)
            }
        };

        let Some(id) = id else {
            debug!("Subscription to a completed bus");
            deliver("on_completed", || observer.on_completed());
            return Subscription::empty();
        };

        let shared = Arc::downgrade(&self.shared);
        Subscription::new(move || {
            if let Some(shared) = shared.upgrade() {
                shared.unsubscribe(id);
            }
        })
    }

    fn listen(&self) -> EventStream {
        let stream = EventStream::attach(|observer| self.subscribe(observer));
        match self.shared.stream_buffer_warn {
            Some(threshold) => stream.warn_when_buffered(threshold),
            None => stream,
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("completed", &self.is_completed())
            .finish()
    }
}
