use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use matchbook::EngineError;

/// Failures surfaced to HTTP clients as the `{code, msg}` envelope.
#[derive(Debug)]
pub enum ApiError {
    SymbolNotAllowed(String),
    UnknownInterval(String),
    NotTraded(String),
    BadRequest(String),
    Forbidden,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnknownInterval(interval) => ApiError::UnknownInterval(interval),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::SymbolNotAllowed(symbol) => (
                StatusCode::BAD_REQUEST,
                format!("Symbol {symbol} is not allowed"),
            ),
            ApiError::UnknownInterval(interval) => (
                StatusCode::BAD_REQUEST,
                format!("Interval {interval} is not allowed"),
            ),
            ApiError::NotTraded(symbol) => (
                StatusCode::BAD_REQUEST,
                format!("Symbol {symbol} is not traded"),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Forbidden: Private API only accessible from localhost".to_string(),
            ),
        };

        let body = Json(json!({ "code": status.as_u16(), "msg": msg }));
        (status, body).into_response()
    }
}

/// Top-level fault barrier: a panicking handler becomes a generic 500
/// envelope while the cause lands in the log.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let cause = if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    error!(%cause, "request handler panicked");

    let body = Json(json!({ "code": 500, "msg": "Internal server error" }));
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}
