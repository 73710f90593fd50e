//! Performance logging interceptor
//!
//! Wraps every dispatched request in a `request` span carrying a fresh
//! correlation id and logs its elapsed time and outcome when it finishes.
//! The exit log lives in a drop guard, so it is written even when the
//! request future is dropped mid-flight or the handler panics.

use crate::utils::TimedOperation;
use async_trait::async_trait;
use hostbus_application::dispatch::{Erased, Interceptor, Next, RequestContext};
use hostbus_application::ports::{Clock, GuidProvider};
use hostbus_domain::error::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, Span, error, info, info_span, warn};

/// How a dispatched request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Handler returned a value
    Success,
    /// Request was cancelled or abandoned
    Cancellation,
    /// Handler reported an expected service error with this code
    Failure(String),
    /// Anything else, including panics
    Unexpected,
}

impl Outcome {
    /// Classify a pipeline result
    pub fn classify<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(Error::Cancelled) => Self::Cancellation,
            Err(Error::Service(service)) => Self::Failure(service.code.clone()),
            Err(_) => Self::Unexpected,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Cancellation => write!(f, "cancellation"),
            Self::Failure(code) => write!(f, "failure ({code})"),
            Self::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Exit log written when the guarded request finishes, one way or another
struct ExecutionLog {
    span: Span,
    request_type: &'static str,
    timer: TimedOperation,
    outcome: Option<Outcome>,
}

impl ExecutionLog {
    fn record(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for ExecutionLog {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or_else(|| {
            if std::thread::panicking() {
                Outcome::Unexpected
            } else {
                Outcome::Cancellation
            }
        });
        let elapsed_ms = self.timer.elapsed_ms();
        let _entered = self.span.enter();
        match outcome {
            Outcome::Success | Outcome::Cancellation => info!(
                elapsed_ms,
                outcome = %outcome,
                "{} execution finished", self.request_type
            ),
            Outcome::Failure(_) => warn!(
                elapsed_ms,
                outcome = %outcome,
                "{} execution finished", self.request_type
            ),
            Outcome::Unexpected => error!(
                elapsed_ms,
                outcome = %outcome,
                "{} execution finished", self.request_type
            ),
        }
    }
}

/// Interceptor logging the duration and outcome of every request
pub struct PerformanceLoggingInterceptor {
    guids: Arc<dyn GuidProvider>,
    clock: Option<Arc<dyn Clock>>,
}

impl PerformanceLoggingInterceptor {
    /// Create the interceptor with its correlation id source
    pub fn new(guids: Arc<dyn GuidProvider>) -> Self {
        Self { guids, clock: None }
    }

    /// Also record the wall-clock start time on the request span
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

#[async_trait]
impl Interceptor for PerformanceLoggingInterceptor {
    async fn intercept(&self, ctx: &RequestContext<'_>, next: Next<'_>) -> Result<Erased> {
        let request_type = ctx.request_type();
        let correlation_id = self.guids.new_guid();
        let span = info_span!(
            "request",
            %correlation_id,
            request_type,
            kind = %ctx.kind(),
            started_at = tracing::field::Empty,
        );
        if let Some(clock) = &self.clock {
            span.record("started_at", tracing::field::display(clock.now().to_rfc3339()));
        }

        let mut log = ExecutionLog {
            span: span.clone(),
            request_type,
            timer: TimedOperation::start(),
            outcome: None,
        };
        async move {
            info!("{request_type} execution started");
            let result = next.run(ctx).await;
            log.record(Outcome::classify(&result));
            result
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for PerformanceLoggingInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceLoggingInterceptor")
            .field("with_clock", &self.clock.is_some())
            .finish()
    }
}
