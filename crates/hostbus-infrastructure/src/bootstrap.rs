//! Core service bootstrap
//!
//! Wires the in-process bus and the dispatcher builder from configuration.
//! Callers add their own handlers to the returned builder before building.

use crate::clock::{RandomGuidProvider, SystemClock};
use crate::config::{AppConfig, ListenerConfig};
use crate::events::{EventBus, ServiceHostEventListener};
use crate::interceptors::PerformanceLoggingInterceptor;
use hostbus_application::dispatch::{Dispatcher, DispatcherBuilder, QueryDispatcher};
use hostbus_application::handlers::{StreamBusEventsQuery, StreamBusEventsQueryHandler};
use hostbus_application::ports::EventListener;
use std::sync::Arc;
use tracing::info;

/// Services shared by every host process
#[derive(Debug)]
pub struct CoreServices {
    /// Process-wide event bus
    pub bus: EventBus,
    /// Dispatcher builder with core interceptors and handlers registered
    pub dispatcher_builder: DispatcherBuilder,
}

/// Build the core services described by `config`
///
/// Registers the performance logging interceptor (when enabled), the bus as
/// an ambient service, and the bus event streaming query handler.
pub fn init_core(config: &AppConfig) -> CoreServices {
    let bus = EventBus::with_stream_buffer_warn(config.event_bus.stream_buffer_warn);

    let mut builder = Dispatcher::builder();
    if config.dispatch.performance_logging {
        let interceptor = PerformanceLoggingInterceptor::new(Arc::new(RandomGuidProvider))
            .with_clock(Arc::new(SystemClock));
        builder = builder.interceptor(Arc::new(interceptor));
    }

    let listener: Arc<dyn EventListener> = Arc::new(bus.clone());
    let builder = builder
        .service(bus.clone())
        .query_handler::<StreamBusEventsQuery, _>(StreamBusEventsQueryHandler::new(listener));

    info!(
        performance_logging = config.dispatch.performance_logging,
        "Core services initialized"
    );
    CoreServices {
        bus,
        dispatcher_builder: builder,
    }
}

/// Build a listener mirroring the service host reachable through `dispatcher`
pub fn remote_listener<D>(
    dispatcher: Arc<D>,
    config: &ListenerConfig,
) -> ServiceHostEventListener<D>
where
    D: QueryDispatcher + 'static,
{
    ServiceHostEventListener::new(dispatcher, Some(config.reconnect_delay()))
}
