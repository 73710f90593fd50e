//! Tests for the command/query dispatcher and its interceptor chain

use async_trait::async_trait;
use hostbus_application::dispatch::{
    CallContext, Command, CommandDispatcher, Dispatcher, Erased, Handler, Interceptor, KeyCallback,
    Next, Query, QueryDispatcher, Request, RequestContext, RequestKind,
};
use hostbus_domain::error::{Error, Result};
use hostbus_domain::value_objects::{ExecutionContext, Principal, ServiceError};
use std::sync::{Arc, Mutex};

type Journal = Arc<Mutex<Vec<String>>>;

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().expect("journal lock").clone()
}

struct RenameTenant {
    name: String,
}

impl Request for RenameTenant {
    type Output = ();
    const KIND: RequestKind = RequestKind::Command;
}

impl Command for RenameTenant {}

struct CountTenants;

impl Request for CountTenants {
    type Output = usize;
    const KIND: RequestKind = RequestKind::Query;
}

impl Query for CountTenants {}

struct Unregistered;

impl Request for Unregistered {
    type Output = ();
    const KIND: RequestKind = RequestKind::Command;
}

impl Command for Unregistered {}

struct RenameTenantHandler {
    journal: Journal,
}

#[async_trait]
impl Handler<RenameTenant> for RenameTenantHandler {
    async fn handle(&self, request: &RenameTenant, _ctx: &RequestContext<'_>) -> Result<()> {
        self.journal
            .lock()
            .expect("journal lock")
            .push(format!("handler:{}", request.name));
        if request.name.is_empty() {
            return Err(ServiceError::validation("name").into());
        }
        Ok(())
    }
}

struct CountTenantsHandler;

#[async_trait]
impl Handler<CountTenants> for CountTenantsHandler {
    async fn handle(&self, _request: &CountTenants, ctx: &RequestContext<'_>) -> Result<usize> {
        let tenants: Arc<Vec<String>> = ctx.services().require()?;
        Ok(tenants.len())
    }
}

struct Recording {
    name: &'static str,
    journal: Journal,
}

impl Recording {
    fn shared(name: &'static str, journal: &Journal) -> Arc<dyn Interceptor> {
        Arc::new(Self {
            name,
            journal: Arc::clone(journal),
        })
    }
}

#[async_trait]
impl Interceptor for Recording {
    async fn intercept(&self, ctx: &RequestContext<'_>, next: Next<'_>) -> Result<Erased> {
        self.journal
            .lock()
            .expect("journal lock")
            .push(format!("{}:before:{}", self.name, ctx.request_type()));
        let result = next.run(ctx).await;
        let outcome = if result.is_ok() { "ok" } else { "err" };
        self.journal
            .lock()
            .expect("journal lock")
            .push(format!("{}:after:{outcome}", self.name));
        result
    }
}

struct ShortCircuit;

#[async_trait]
impl Interceptor for ShortCircuit {
    async fn intercept(&self, _ctx: &RequestContext<'_>, _next: Next<'_>) -> Result<Erased> {
        Err(ServiceError::precondition("maintenance").into())
    }
}

#[tokio::test]
async fn test_missing_handler_reports_handler_not_found() {
    let dispatcher = Dispatcher::builder().build();

    let err = dispatcher
        .dispatch_command(Unregistered, &CallContext::default())
        .await
        .expect_err("no handler registered");

    match err {
        Error::HandlerNotFound { request_type } => {
            assert!(request_type.ends_with("Unregistered"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_interceptors_wrap_handler_in_registration_order() {
    let journal = journal();
    let dispatcher = Dispatcher::builder()
        .interceptor(Recording::shared("A", &journal))
        .interceptor(Recording::shared("B", &journal))
        .command_handler::<RenameTenant, _>(RenameTenantHandler {
            journal: Arc::clone(&journal),
        })
        .build();

    dispatcher
        .dispatch_command(
            RenameTenant {
                name: "acme".to_string(),
            },
            &CallContext::default(),
        )
        .await
        .expect("dispatch succeeds");

    assert_eq!(
        entries(&journal),
        vec![
            "A:before:RenameTenant",
            "B:before:RenameTenant",
            "handler:acme",
            "B:after:ok",
            "A:after:ok",
        ]
    );
}

#[tokio::test]
async fn test_service_error_propagates_through_interceptors_unchanged() {
    let journal = journal();
    let dispatcher = Dispatcher::builder()
        .interceptor(Recording::shared("A", &journal))
        .interceptor(Recording::shared("B", &journal))
        .command_handler::<RenameTenant, _>(RenameTenantHandler {
            journal: Arc::clone(&journal),
        })
        .build();

    let err = dispatcher
        .dispatch_command(
            RenameTenant {
                name: String::new(),
            },
            &CallContext::default(),
        )
        .await
        .expect_err("empty name is rejected");

    assert_eq!(err.service_code(), Some("validation_failed"));
    assert_eq!(
        err.as_service_error().map(|e| e.args.clone()),
        Some(vec!["name".to_string()])
    );
    let log = entries(&journal);
    assert_eq!(log.last().map(String::as_str), Some("A:after:err"));
    assert!(log.contains(&"B:after:err".to_string()));
}

#[tokio::test]
async fn test_scoped_interceptors_run_inside_global_ones() {
    let journal = journal();
    let dispatcher = Dispatcher::builder()
        .scoped_interceptor::<RenameTenant>(Recording::shared("scoped", &journal))
        .interceptor(Recording::shared("global", &journal))
        .command_handler::<RenameTenant, _>(RenameTenantHandler {
            journal: Arc::clone(&journal),
        })
        .query_handler::<CountTenants, _>(CountTenantsHandler)
        .service(Arc::new(vec!["acme".to_string()]))
        .build();

    dispatcher
        .dispatch_command(
            RenameTenant {
                name: "acme".to_string(),
            },
            &CallContext::default(),
        )
        .await
        .expect("dispatch succeeds");
    assert_eq!(
        entries(&journal)[..3],
        [
            "global:before:RenameTenant".to_string(),
            "scoped:before:RenameTenant".to_string(),
            "handler:acme".to_string(),
        ]
    );

    journal.lock().expect("journal lock").clear();
    let count = dispatcher
        .dispatch_query(CountTenants, &CallContext::default())
        .await
        .expect("query succeeds");
    assert_eq!(count, 1);
    assert!(
        entries(&journal)
            .iter()
            .all(|entry| !entry.starts_with("scoped"))
    );
}

#[tokio::test]
async fn test_interceptor_can_short_circuit_the_handler() {
    let journal = journal();
    let dispatcher = Dispatcher::builder()
        .interceptor(Arc::new(ShortCircuit))
        .command_handler::<RenameTenant, _>(RenameTenantHandler {
            journal: Arc::clone(&journal),
        })
        .build();

    let err = dispatcher
        .dispatch_command(
            RenameTenant {
                name: "acme".to_string(),
            },
            &CallContext::default(),
        )
        .await
        .expect_err("short-circuited");

    assert_eq!(err.service_code(), Some("precondition_failed"));
    assert!(entries(&journal).is_empty());
}

#[tokio::test]
async fn test_query_dispatcher_trait_returns_typed_output() {
    let dispatcher = Dispatcher::builder()
        .query_handler::<CountTenants, _>(CountTenantsHandler)
        .service(Arc::new(vec!["a".to_string(), "b".to_string()]))
        .build();

    let count = QueryDispatcher::query(&dispatcher, CountTenants, CallContext::default())
        .await
        .expect("query succeeds");

    assert_eq!(count, 2);
    assert!(dispatcher.handles::<CountTenants>());
    assert!(!dispatcher.handles::<Unregistered>());
}

#[tokio::test]
async fn test_missing_service_is_an_internal_error() {
    let dispatcher = Dispatcher::builder()
        .query_handler::<CountTenants, _>(CountTenantsHandler)
        .build();

    let err = dispatcher
        .dispatch_query(CountTenants, &CallContext::default())
        .await
        .expect_err("service missing");

    assert!(matches!(err, Error::Internal { .. }));
}

struct WhoAmI;

impl Request for WhoAmI {
    type Output = Option<String>;
    const KIND: RequestKind = RequestKind::Query;
}

impl Query for WhoAmI {}

struct WhoAmIHandler;

#[async_trait]
impl Handler<WhoAmI> for WhoAmIHandler {
    async fn handle(&self, _request: &WhoAmI, ctx: &RequestContext<'_>) -> Result<Option<String>> {
        Ok(ctx.execution().principal.name.clone())
    }
}

#[tokio::test]
async fn test_handler_sees_caller_execution_context() {
    let dispatcher = Dispatcher::builder()
        .query_handler::<WhoAmI, _>(WhoAmIHandler)
        .build();
    let execution = ExecutionContext::new(
        Principal::authenticated("Bearer", "alice"),
        "en-US",
        "de-DE",
    );

    let name = dispatcher
        .dispatch_query(WhoAmI, &CallContext::new(execution, Default::default()))
        .await
        .expect("query succeeds");

    assert_eq!(name.as_deref(), Some("alice"));
}

struct CreateTenant {
    name: String,
    on_created: Option<KeyCallback<u64>>,
}

impl Request for CreateTenant {
    type Output = ();
    const KIND: RequestKind = RequestKind::Command;
}

impl Command for CreateTenant {}

struct CreateTenantHandler;

#[async_trait]
impl Handler<CreateTenant> for CreateTenantHandler {
    async fn handle(&self, request: &CreateTenant, _ctx: &RequestContext<'_>) -> Result<()> {
        let key = request.name.len() as u64;
        if let Some(callback) = &request.on_created {
            callback.invoke(&key);
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_command_reports_generated_key_through_callback() {
    let dispatcher = Dispatcher::builder()
        .command_handler::<CreateTenant, _>(CreateTenantHandler)
        .build();
    let created = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&created);

    dispatcher
        .execute(
            CreateTenant {
                name: "acme".to_string(),
                on_created: Some(KeyCallback::new(move |key: &u64| {
                    *sink.lock().expect("key lock") = Some(*key);
                })),
            },
            CallContext::default(),
        )
        .await
        .expect("tenant created");

    assert_eq!(*created.lock().expect("key lock"), Some(4));

    dispatcher
        .execute(
            CreateTenant {
                name: "quiet".to_string(),
                on_created: None,
            },
            CallContext::default(),
        )
        .await
        .expect("callback is optional");
}
