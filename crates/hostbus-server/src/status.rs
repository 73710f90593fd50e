//! Error to gRPC status translation
//!
//! Service errors keep their machine-readable code and arguments in
//! metadata so the calling side can rebuild the exact [`ServiceError`].

use crate::constants::{TRAILER_SERVICE_ERROR_ARG, TRAILER_SERVICE_ERROR_CODE};
use hostbus_domain::constants::{
    SERVICE_ERROR_CONFLICT, SERVICE_ERROR_NOT_FOUND, SERVICE_ERROR_PRECONDITION,
    SERVICE_ERROR_VALIDATION,
};
use hostbus_domain::error::Error;
use hostbus_domain::value_objects::ServiceError;
use tonic::metadata::{MetadataMap, MetadataValue};
use tonic::{Code, Status};
use tracing::warn;

/// Translate a domain error into the status returned to the caller
pub fn to_status(error: &Error) -> Status {
    match error {
        Error::Service(service) => service_status(service),
        Error::HandlerNotFound { .. } => Status::unimplemented(error.to_string()),
        Error::Protocol { .. } => Status::failed_precondition(error.to_string()),
        Error::Cancelled => Status::cancelled(error.to_string()),
        _ => Status::internal(error.to_string()),
    }
}

fn service_status(service: &ServiceError) -> Status {
    let code = match service.code.as_str() {
        SERVICE_ERROR_VALIDATION => Code::InvalidArgument,
        SERVICE_ERROR_NOT_FOUND => Code::NotFound,
        SERVICE_ERROR_CONFLICT => Code::AlreadyExists,
        SERVICE_ERROR_PRECONDITION => Code::FailedPrecondition,
        _ => Code::Unknown,
    };

    let mut metadata = MetadataMap::new();
    match service.code.parse::<MetadataValue<_>>() {
        Ok(value) => {
            metadata.insert(TRAILER_SERVICE_ERROR_CODE, value);
        }
        Err(_) => warn!(
            code = %service.code,
            "Service error code is not ASCII, sent without metadata"
        ),
    }
    for arg in &service.args {
        metadata.append_bin(TRAILER_SERVICE_ERROR_ARG, MetadataValue::from_bytes(arg.as_bytes()));
    }
    Status::with_metadata(code, service.to_string(), metadata)
}

/// Translate a status received from a service host back into a domain error
pub fn from_status(status: &Status) -> Error {
    if let Some(service) = service_error(status.metadata()) {
        return service.into();
    }
    match status.code() {
        Code::Unimplemented => Error::handler_not_found(status.message()),
        Code::Cancelled => Error::Cancelled,
        Code::FailedPrecondition => Error::protocol(status.message()),
        Code::Unavailable | Code::DeadlineExceeded | Code::Aborted => {
            Error::transport(format!("{}: {}", status.code(), status.message()))
        }
        code => Error::unexpected(format!("{code}: {}", status.message())),
    }
}

fn service_error(metadata: &MetadataMap) -> Option<ServiceError> {
    let code = metadata.get(TRAILER_SERVICE_ERROR_CODE)?.to_str().ok()?;
    let args: Vec<String> = metadata
        .get_all_bin(TRAILER_SERVICE_ERROR_ARG)
        .iter()
        .filter_map(|value| value.to_bytes().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .collect();
    Some(ServiceError::new(code, args))
}
