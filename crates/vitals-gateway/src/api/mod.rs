//! Demo business API.
//!
//! These handlers are the callers of the metrics registry: each one records
//! the request/error/operation events it represents.
//!
//! - `GET  /api/hello`
//! - `POST /api/operation?type=...` : timed, may fail by configuration
//! - `GET  /api/error`              : always 500, counts an error
//! - `POST /api/users/active?count=N`
//! - `GET  /api/info`

mod handlers;

pub use handlers::{hello, info, operation, simulate_error, update_active_users};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use vitals_core::error::{ClientCode, VitalsError};

/// JSON error body shared by the API handlers.
pub(crate) fn error_response(status: StatusCode, code: ClientCode, msg: &str) -> Response {
    (
        status,
        Json(json!({
            "error": {
                "code": code.as_str(),
                "message": msg
            }
        })),
    )
        .into_response()
}

fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::BadRequest | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
        ClientCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map an error to a status code and JSON body.
pub(crate) fn into_response(e: &VitalsError) -> Response {
    error_response(status_for(e.client_code()), e.client_code(), &e.to_string())
}
