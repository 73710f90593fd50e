//! Execution context propagation
//!
//! Every call into a service host carries the caller's identity and
//! cultures in request metadata:
//!
//! | Header | Kind | Required |
//! |--------|------|----------|
//! | `identity-authentication-type` | ASCII | no |
//! | `identity-name-bin` | binary (UTF-8) | no |
//! | `culture-name` | ASCII | yes |
//! | `ui-culture-name` | ASCII | yes |
//!
//! The principal is anonymous unless both identity headers are present.
//! [`ExecutionContextInterceptor`] is a plain `tonic` interceptor, so it
//! behaves the same for unary, client-streaming, server-streaming and duplex
//! methods.

use crate::constants::{
    HEADER_AUTHENTICATION_TYPE, HEADER_CULTURE, HEADER_IDENTITY_NAME, HEADER_UI_CULTURE,
};
use hostbus_domain::error::{Error, Result};
use hostbus_domain::value_objects::{ExecutionContext, Principal};
use std::future::Future;
use tonic::metadata::{MetadataMap, MetadataValue};
use tonic::service::Interceptor;
use tonic::{Request, Response, Status};
use tracing::debug;

/// Server interceptor installing the caller's [`ExecutionContext`]
///
/// Fails the call with `FAILED_PRECONDITION` before any handler runs when a
/// culture header is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionContextInterceptor;

impl Interceptor for ExecutionContextInterceptor {
    fn call(&mut self, mut request: Request<()>) -> std::result::Result<Request<()>, Status> {
        let context = read_execution_context(request.metadata())?;
        debug!(
            authenticated = context.principal.is_authenticated(),
            culture = %context.culture,
            ui_culture = %context.ui_culture,
            "Execution context received"
        );
        request.extensions_mut().insert(context);
        Ok(request)
    }
}

/// Parse the execution context headers of a call
pub fn read_execution_context(
    metadata: &MetadataMap,
) -> std::result::Result<ExecutionContext, Status> {
    let culture = required_ascii(metadata, HEADER_CULTURE)?;
    let ui_culture = required_ascii(metadata, HEADER_UI_CULTURE)?;

    let authentication_type = optional_ascii(metadata, HEADER_AUTHENTICATION_TYPE)?;
    let name = match metadata.get_bin(HEADER_IDENTITY_NAME) {
        Some(value) => {
            let bytes = value.to_bytes().map_err(|_| {
                Status::invalid_argument(format!("{HEADER_IDENTITY_NAME} is not valid base64"))
            })?;
            let name = String::from_utf8(bytes.to_vec()).map_err(|_| {
                Status::invalid_argument(format!("{HEADER_IDENTITY_NAME} is not valid UTF-8"))
            })?;
            Some(name)
        }
        None => None,
    };

    let principal = match (authentication_type, name) {
        (Some(authentication_type), Some(name)) => {
            Principal::authenticated(authentication_type, name)
        }
        _ => Principal::anonymous(),
    };
    Ok(ExecutionContext::new(principal, culture, ui_culture))
}

/// Write `context` into outgoing request metadata
///
/// Identity headers are only written for an authenticated principal.
pub fn write_execution_context(
    context: &ExecutionContext,
    metadata: &mut MetadataMap,
) -> Result<()> {
    metadata.insert(HEADER_CULTURE, ascii_value(HEADER_CULTURE, &context.culture)?);
    metadata.insert(HEADER_UI_CULTURE, ascii_value(HEADER_UI_CULTURE, &context.ui_culture)?);

    if let (Some(authentication_type), Some(name)) = (
        context.principal.authentication_type.as_deref(),
        context.principal.name.as_deref(),
    ) {
        metadata.insert(
            HEADER_AUTHENTICATION_TYPE,
            ascii_value(HEADER_AUTHENTICATION_TYPE, authentication_type)?,
        );
        metadata.insert_bin(HEADER_IDENTITY_NAME, MetadataValue::from_bytes(name.as_bytes()));
    }
    Ok(())
}

/// The execution context installed by [`ExecutionContextInterceptor`]
pub fn execution_context<T>(request: &Request<T>) -> Option<&ExecutionContext> {
    request.extensions().get::<ExecutionContext>()
}

/// Run `interceptor`, then `handler` with the installed execution context
///
/// The handler is never invoked when the interceptor rejects the call.
pub async fn guarded<I, T, R, F, Fut>(
    interceptor: &mut I,
    request: Request<T>,
    handler: F,
) -> std::result::Result<Response<R>, Status>
where
    I: Interceptor,
    F: FnOnce(ExecutionContext, T) -> Fut,
    Fut: Future<Output = std::result::Result<R, Status>>,
{
    let (metadata, extensions, message) = request.into_parts();
    let checked = interceptor.call(Request::from_parts(metadata, extensions, ()))?;
    let context = execution_context(&checked)
        .cloned()
        .ok_or_else(|| Status::internal("interceptor did not install an execution context"))?;

    handler(context, message).await.map(Response::new)
}

fn required_ascii(
    metadata: &MetadataMap,
    key: &'static str,
) -> std::result::Result<String, Status> {
    optional_ascii(metadata, key)?
        .ok_or_else(|| Status::failed_precondition(format!("missing required header {key}")))
}

fn optional_ascii(
    metadata: &MetadataMap,
    key: &'static str,
) -> std::result::Result<Option<String>, Status> {
    metadata
        .get(key)
        .map(|value| {
            value
                .to_str()
                .map(str::to_string)
                .map_err(|_| Status::invalid_argument(format!("{key} is not printable ASCII")))
        })
        .transpose()
}

fn ascii_value(key: &str, value: &str) -> Result<MetadataValue<tonic::metadata::Ascii>> {
    value
        .parse()
        .map_err(|_| Error::protocol(format!("{key} value {value:?} is not printable ASCII")))
}
