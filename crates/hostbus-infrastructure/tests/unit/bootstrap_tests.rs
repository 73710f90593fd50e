//! Bootstrap Tests

use futures::StreamExt;
use hostbus_application::dispatch::CallContext;
use hostbus_application::handlers::StreamBusEventsQuery;
use hostbus_application::ports::EventListener;
use hostbus_domain::events::{Event, ProgressEvent};
use hostbus_infrastructure::bootstrap::{init_core, remote_listener};
use hostbus_infrastructure::config::AppConfig;
use hostbus_infrastructure::events::EventBus;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_core_streams_bus_events_through_dispatcher() {
    let core = init_core(&AppConfig::default());
    let dispatcher = Arc::new(core.dispatcher_builder.build());
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let cancellation = CancellationToken::new();
    let call = CallContext::default().with_cancellation(cancellation.clone());

    let task = tokio::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        async move {
            let query = StreamBusEventsQuery::new(move |event| {
                sink.lock().expect("sink lock").push(event);
            });
            dispatcher.dispatch_query(query, &call).await
        }
    });
    while core.bus.subscriber_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    core.bus.notify(ProgressEvent::new(0.4, None).into());
    cancellation.cancel();

    let delivered = task.await.expect("task joins").expect("stream ends");
    assert_eq!(delivered, 1);
    assert_eq!(received.lock().expect("sink lock").len(), 2);
    assert!(dispatcher.services().get::<EventBus>().is_some());
}

#[tokio::test]
async fn test_remote_listener_mirrors_host_bus() {
    let core = init_core(&AppConfig::default());
    let host_bus = core.bus.clone();
    let dispatcher = Arc::new(core.dispatcher_builder.build());
    let mut config = AppConfig::default();
    config.listener.reconnect_delay_ms = 50;

    let listener = remote_listener(dispatcher, &config.listener);
    assert_eq!(listener.reconnect_delay(), Duration::from_millis(50));
    let mut events = listener.listen();

    assert_eq!(events.next().await, Some(Event::StreamInit));
    host_bus.notify(ProgressEvent::new(0.9, None).into());
    assert_eq!(
        events.next().await,
        Some(ProgressEvent::new(0.9, None).into())
    );
    assert!(*listener.is_active().borrow());
}
