//! Service host client Tests

use crate::service_host::{host, wait_for_subscribers};
use futures::{StreamExt, stream};
use hostbus_application::dispatch::{
    CallContext, Dispatcher, Query, QueryDispatcher, Request, RequestKind,
};
use hostbus_application::handlers::StreamBusEventsQuery;
use hostbus_application::ports::{EventListener, EventStream};
use hostbus_domain::error::Error;
use hostbus_domain::events::{Event, ProgressEvent};
use hostbus_infrastructure::events::ServiceHostEventListener;
use hostbus_server::client::ServiceHostClient;
use hostbus_server::service_host::{EventFrame, ServiceHost};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tonic::Status;

type Links = Arc<Mutex<Vec<CancellationToken>>>;

/// Client whose connections to `host` can be cut from the test
fn severable_client(host: ServiceHost<Dispatcher>) -> (ServiceHostClient, Links) {
    let host = Arc::new(host);
    let links: Links = Arc::new(Mutex::new(Vec::new()));
    let opened = Arc::clone(&links);
    let client = ServiceHostClient::new(move |request| {
        let host = Arc::clone(&host);
        let opened = Arc::clone(&opened);
        async move {
            let frames = host.stream_events(request).await?.into_inner();
            let link = CancellationToken::new();
            opened.lock().expect("links lock").push(link.clone());
            let reset = stream::once(async {
                EventFrame::Err(Status::unavailable("connection reset"))
            });
            Ok::<_, Status>(frames.take_until(link.cancelled_owned()).chain(reset))
        }
    });
    (client, links)
}

async fn next_event(events: &mut EventStream) -> Event {
    tokio::time::timeout(Duration::from_secs(1), events.next())
        .await
        .expect("event arrives")
        .expect("stream open")
}

struct CountTenants;

impl Request for CountTenants {
    type Output = usize;
    const KIND: RequestKind = RequestKind::Query;
}

impl Query for CountTenants {}

#[tokio::test]
async fn test_listener_mirrors_host_and_recovers_after_connection_reset() {
    let (host, bus) = host();
    let (client, links) = severable_client(host);
    let listener =
        ServiceHostEventListener::new(Arc::new(client), Some(Duration::from_millis(20)));
    let mut active = listener.is_active();
    let mut events = listener.listen();

    assert_eq!(next_event(&mut events).await, Event::StreamInit);
    let progress: Event = ProgressEvent::new(0.3, None).into();
    bus.notify(progress.clone());
    assert_eq!(next_event(&mut events).await, progress);

    links.lock().expect("links lock")[0].cancel();
    tokio::time::timeout(Duration::from_secs(1), active.changed())
        .await
        .expect("liveness changes")
        .expect("listener alive");
    assert!(!*active.borrow_and_update());

    assert_eq!(next_event(&mut events).await, Event::StreamInit);
    assert!(*active.borrow_and_update());
    assert_eq!(links.lock().expect("links lock").len(), 2);
    wait_for_subscribers(&bus, 1).await;

    let resumed: Event = ProgressEvent::new(0.8, None).into();
    bus.notify(resumed.clone());
    assert_eq!(next_event(&mut events).await, resumed);
}

#[tokio::test]
async fn test_cancelled_call_streams_until_cancellation() {
    let (host, bus) = host();
    let (client, _links) = severable_client(host);
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let cancellation = CancellationToken::new();
    let call = CallContext::default().with_cancellation(cancellation.clone());

    let task = tokio::spawn(async move {
        let query = StreamBusEventsQuery::new(move |event| {
            sink.lock().expect("sink lock").push(event);
        });
        client.query(query, call).await
    });
    wait_for_subscribers(&bus, 1).await;
    bus.notify(ProgressEvent::new(0.5, None).into());
    while received.lock().expect("sink lock").len() < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cancellation.cancel();

    let delivered = task.await.expect("task joins").expect("stream ends cleanly");
    assert_eq!(delivered, 1);
    assert_eq!(received.lock().expect("sink lock")[0], Event::StreamInit);
    wait_for_subscribers(&bus, 0).await;
}

#[tokio::test]
async fn test_pre_cancelled_call_never_connects() {
    let connects = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connects);
    let client = ServiceHostClient::new(move |_request| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, Status>(stream::empty::<EventFrame>()) }
    });
    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let delivered = client
        .query(
            StreamBusEventsQuery::new(|_| {}),
            CallContext::default().with_cancellation(cancellation),
        )
        .await
        .expect("cancelled call succeeds");

    assert_eq!(delivered, 0);
    assert_eq!(connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_host_status_becomes_domain_error() {
    let host = ServiceHost::new(Arc::new(Dispatcher::builder().build()));
    let (client, _links) = severable_client(host);

    let err = client
        .query(StreamBusEventsQuery::new(|_| {}), CallContext::default())
        .await
        .expect_err("host has no stream handler");

    assert!(matches!(err, Error::HandlerNotFound { .. }));
}

#[tokio::test]
async fn test_other_queries_are_not_served() {
    let client = ServiceHostClient::new(|_request| async {
        Ok::<_, Status>(stream::empty::<EventFrame>())
    });

    let err = client
        .query(CountTenants, CallContext::default())
        .await
        .expect_err("only bus event streams are carried");

    assert!(matches!(
        err,
        Error::HandlerNotFound { request_type } if request_type == "CountTenants"
    ));
}
