//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → handlers: credential.rs, anchor.rs, verify.rs, receipt.rs,
//!                 health.rs, network.rs
//!     → error.rs (ApiError → {ok: false, error, detail?})
//! ```

pub mod anchor;
pub mod credential;
pub mod error;
pub mod health;
pub mod network;
pub mod receipt;
pub mod request;
pub mod server;
pub mod verify;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

pub use error::{ApiError, ApiResult};
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

/// A JSON body whose rejection is turned into an [`ApiError`] by the handler.
pub type JsonBody = Result<Json<Value>, JsonRejection>;

/// Unparsable bodies are input errors (400); oversized ones are 413.
fn json_body(body: JsonBody) -> ApiResult<Value> {
    body.map(|Json(value)| value).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::TooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    })
}

/// A string field of a JSON object; missing or non-string values read as "".
fn string_field<'a>(body: &'a Value, name: &str) -> &'a str {
    body.get(name).and_then(Value::as_str).unwrap_or("")
}
