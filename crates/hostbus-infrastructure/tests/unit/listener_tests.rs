//! ServiceHostEventListener Tests

use crate::test_utils::LogCapture;
use async_trait::async_trait;
use futures::StreamExt;
use hostbus_application::dispatch::{Dispatcher, Handler, RequestContext};
use hostbus_application::handlers::StreamBusEventsQuery;
use hostbus_application::ports::EventListener;
use hostbus_domain::error::{Error, Result};
use hostbus_domain::events::{Event, ProgressEvent};
use hostbus_infrastructure::events::ServiceHostEventListener;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted connection attempt
enum Attempt {
    /// Fail the attempt with a transport error
    Fail(&'static str),
    /// Return normally without cancellation
    Return,
    /// Deliver the events, then stay connected until cancelled
    Stream(Vec<Event>),
    /// Deliver the events, then drop the connection
    StreamThenFail(Vec<Event>, &'static str),
    /// Deliver the events, then hang without observing cancellation
    StreamThenHang(Vec<Event>),
}

struct ScriptedHost {
    attempts: Mutex<VecDeque<Attempt>>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler<StreamBusEventsQuery> for ScriptedHost {
    async fn handle(&self, query: &StreamBusEventsQuery, ctx: &RequestContext<'_>) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let attempt = self
            .attempts
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(Attempt::Stream(Vec::new()));
        match attempt {
            Attempt::Fail(message) => Err(Error::transport(message)),
            Attempt::Return => Ok(0),
            Attempt::Stream(events) => {
                let delivered = events.len() as u64;
                for event in events {
                    query.deliver(event);
                }
                ctx.cancellation().cancelled().await;
                Ok(delivered)
            }
            Attempt::StreamThenFail(events, message) => {
                for event in events {
                    query.deliver(event);
                }
                Err(Error::transport(message))
            }
            Attempt::StreamThenHang(events) => {
                for event in events {
                    query.deliver(event);
                }
                std::future::pending().await
            }
        }
    }
}

fn scripted(attempts: Vec<Attempt>) -> (Arc<Dispatcher>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let host = ScriptedHost {
        attempts: Mutex::new(attempts.into()),
        calls: Arc::clone(&calls),
    };
    let dispatcher = Dispatcher::builder()
        .query_handler::<StreamBusEventsQuery, _>(host)
        .build();
    (Arc::new(dispatcher), calls)
}

fn progress(value: f32) -> Event {
    ProgressEvent::new(value, None).into()
}

#[tokio::test]
async fn test_connection_starts_lazily() {
    let (dispatcher, calls) = scripted(vec![]);
    let listener = ServiceHostEventListener::new(dispatcher, None);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!listener.is_started());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(listener.reconnect_delay(), Duration::from_millis(500));

    let _events = listener.listen();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(listener.is_started());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_is_active_flips_once_and_recovers_on_next_event() {
    let capture = LogCapture::default();
    let _guard = capture.install();
    let (dispatcher, calls) = scripted(vec![
        Attempt::Fail("connection refused"),
        Attempt::Fail("connection refused"),
        Attempt::Fail("connection refused"),
        Attempt::Stream(vec![Event::StreamInit, progress(0.5)]),
    ]);
    let listener = ServiceHostEventListener::new(dispatcher, Some(Duration::from_millis(500)));
    let mut active = listener.is_active();
    assert!(*active.borrow_and_update());

    let mut events = listener.listen();

    active.changed().await.expect("listener alive");
    assert!(!*active.borrow_and_update());

    assert_eq!(events.next().await, Some(Event::StreamInit));
    assert_eq!(events.next().await, Some(progress(0.5)));
    assert!(*active.borrow_and_update());
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    assert_eq!(capture.lines_with("Service host event stream failed").len(), 1);
    assert_eq!(capture.lines_with("Service host event stream still failing").len(), 2);
    assert_eq!(capture.lines_with("Service host event stream restored").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_error_dedup_resets_after_successful_event() {
    let capture = LogCapture::default();
    let _guard = capture.install();
    let (dispatcher, _calls) = scripted(vec![
        Attempt::Fail("connection refused"),
        Attempt::StreamThenFail(vec![progress(0.1)], "connection refused"),
        Attempt::Stream(vec![progress(1.0)]),
    ]);
    let listener = ServiceHostEventListener::new(dispatcher, None);

    let mut events = listener.listen();
    assert_eq!(events.next().await, Some(progress(0.1)));
    assert_eq!(events.next().await, Some(progress(1.0)));

    let failures = capture.lines_with("Service host event stream failed");
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|line| line.contains("connection refused")));
    assert!(capture.lines_with("still failing").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_normal_return_is_a_protocol_violation_and_reconnects() {
    let capture = LogCapture::default();
    let _guard = capture.install();
    let (dispatcher, calls) = scripted(vec![
        Attempt::Return,
        Attempt::Stream(vec![progress(0.1)]),
    ]);
    let listener = ServiceHostEventListener::new(dispatcher, None);
    let mut active = listener.is_active();

    let mut events = listener.listen();
    active.changed().await.expect("listener alive");
    assert!(!*active.borrow_and_update());

    assert_eq!(events.next().await, Some(progress(0.1)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(capture.lines_with("Protocol violation").len(), 1);
}

#[tokio::test]
async fn test_subscribers_share_one_connection() {
    let (dispatcher, calls) = scripted(vec![Attempt::Stream(vec![progress(0.3)])]);
    let listener = ServiceHostEventListener::new(dispatcher, None);

    let mut first = listener.listen();
    let mut second = listener.listen();

    assert_eq!(first.next().await, Some(progress(0.3)));
    assert_eq!(second.next().await, Some(progress(0.3)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_drop_completes_subscribers_and_stops_loop() {
    let (dispatcher, calls) = scripted(vec![Attempt::Stream(vec![progress(0.7)])]);
    let listener = ServiceHostEventListener::new(dispatcher, None);
    let mut events = listener.listen();
    assert_eq!(events.next().await, Some(progress(0.7)));

    listener.dispose();

    let end = tokio::time::timeout(Duration::from_secs(1), events.next())
        .await
        .expect("stream completes after dispose");
    assert_eq!(end, None);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_drop_right_after_subscribe_completes_subscribers() {
    let (dispatcher, calls) = scripted(vec![]);
    let listener = ServiceHostEventListener::new(dispatcher, None);
    let mut events = listener.listen();

    drop(listener);

    let end = tokio::time::timeout(Duration::from_secs(1), events.next())
        .await
        .expect("stream completes after drop");
    assert_eq!(end, None);
    assert!(calls.load(Ordering::SeqCst) <= 1);
}

#[tokio::test]
async fn test_dispose_completes_subscribers_when_host_ignores_cancellation() {
    let (dispatcher, _calls) = scripted(vec![Attempt::StreamThenHang(vec![Event::StreamInit])]);
    let listener = ServiceHostEventListener::new(dispatcher, None);
    let mut events = listener.listen();
    assert_eq!(events.next().await, Some(Event::StreamInit));

    listener.dispose();

    let end = tokio::time::timeout(Duration::from_secs(2), events.next())
        .await
        .expect("stream completes after dispose");
    assert_eq!(end, None);
}

#[tokio::test(start_paused = true)]
async fn test_stream_init_alone_does_not_reset_error_dedup() {
    let capture = LogCapture::default();
    let _guard = capture.install();
    let (dispatcher, _calls) = scripted(vec![
        Attempt::Fail("connection refused"),
        Attempt::StreamThenFail(vec![Event::StreamInit], "connection refused"),
        Attempt::StreamThenFail(vec![Event::StreamInit], "connection refused"),
        Attempt::Stream(vec![Event::StreamInit, progress(0.2)]),
    ]);
    let listener = ServiceHostEventListener::new(dispatcher, None);

    let mut events = listener.listen();
    for _ in 0..3 {
        assert_eq!(events.next().await, Some(Event::StreamInit));
    }
    assert_eq!(events.next().await, Some(progress(0.2)));

    assert_eq!(capture.lines_with("Service host event stream failed").len(), 1);
    assert_eq!(capture.lines_with("Service host event stream still failing").len(), 2);
}
