//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CheckoutError, ErrorKind};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout body that could not be decoded.
    MalformedCheckout(String),
    /// Order placement failed.
    Checkout(CheckoutError),
    /// A read from the store failed.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => message_response(StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => message_response(StatusCode::BAD_REQUEST, msg),
            ApiError::MalformedCheckout(msg) => {
                kind_response(StatusCode::BAD_REQUEST, msg, ErrorKind::InvalidInput, false)
            }
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store read failed");
                kind_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    STORE_UNAVAILABLE.to_string(),
                    ErrorKind::PersistenceFailure,
                    true,
                )
            }
        }
    }
}

const STORE_UNAVAILABLE: &str = "Storage is temporarily unavailable, please try again";

fn kind_response(
    status: StatusCode,
    message: String,
    kind: ErrorKind,
    retriable: bool,
) -> Response {
    let body = serde_json::json!({
        "error": message,
        "kind": kind,
        "retriable": retriable,
    });
    (status, axum::Json(body)).into_response()
}

fn message_response(status: StatusCode, message: String) -> Response {
    let body = serde_json::json!({ "error": message });
    (status, axum::Json(body)).into_response()
}

fn checkout_error_to_response(err: CheckoutError) -> Response {
    let status = match err.kind() {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::ItemUnavailable => StatusCode::CONFLICT,
        ErrorKind::PersistenceFailure => StatusCode::SERVICE_UNAVAILABLE,
    };

    let mut body = serde_json::json!({
        "error": err.user_message(),
        "kind": err.kind(),
        "retriable": err.is_retriable(),
    });
    if let Some(product_id) = err.product_id() {
        body["product_id"] = serde_json::json!(product_id);
    }
    (status, axum::Json(body)).into_response()
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedCheckout(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
