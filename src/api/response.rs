use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::any::Any;
use tracing::{error, warn};

use crate::services::ServiceError;

/// Uniform body of every response
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: &'static str,
    pub data: T,
}

/// Successful handler output, wrapped in an [`Envelope`]
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            status: self.status.as_u16(),
            message: "success",
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::InvalidInput(_)
        | ServiceError::NotFound(_)
        | ServiceError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let body = Envelope {
        status: status.as_u16(),
        message: "error",
        data: message,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let message = match &self {
            ServiceError::Internal(e) => {
                error!(error = %e, "Request failed with internal error");
                "internal server error".to_string()
            }
            other => {
                warn!(kind = other.kind(), error = %other, "Request rejected");
                other.to_string()
            }
        };
        error_response(status, message)
    }
}

/// Malformed or missing JSON body
pub fn bad_body(rejection: JsonRejection) -> ServiceError {
    ServiceError::InvalidInput(format!("invalid request body: {}", rejection.body_text()))
}

/// Parse a path segment as a positive row id
pub fn parse_id(raw: &str, what: &str) -> Result<i64, ServiceError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ServiceError::InvalidInput(format!("invalid {what} ID: {raw}"))),
    }
}

/// Response used by `CatchPanicLayer` when a handler panics
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "Handler panicked");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_string(),
    )
}
