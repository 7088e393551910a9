//! API error type and its JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::blockchain::ChainError;
use crate::hashing::HashError;
use crate::identity::DidError;
use crate::receipt::ReceiptError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Request body over `security.max_body_size`.
    #[error("{0}")]
    TooLarge(String),

    /// The upstream anchor backend failed or answered non-2xx.
    #[error("{error}")]
    Upstream { error: String, detail: Option<String> },

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Did(#[from] DidError),

    #[error(transparent)]
    Receipt(#[from] ReceiptError),
}

/// `{ok: false, error, detail?}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Did(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Hash(HashError::NoInput) => StatusCode::BAD_REQUEST,
            ApiError::Hash(HashError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Hash(HashError::Fetch(_) | HashError::FetchStatus { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) | ApiError::Chain(_) | ApiError::Hash(_) | ApiError::Receipt(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        }

        let detail = match &self {
            ApiError::Upstream { detail, .. } => detail.clone(),
            _ => None,
        };
        let body = ErrorBody {
            ok: false,
            error: self.to_string(),
            detail,
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::TooLarge("x".into()).status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            ApiError::Upstream { error: "x".into(), detail: None }.status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::Chain(ChainError::NodeSyncing).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::Did(DidError::Format).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Hash(HashError::TooLarge { limit: 1 }).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_body_shape() {
        let body = ErrorBody {
            ok: false,
            error: "anchor failed".into(),
            detail: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"ok": false, "error": "anchor failed"}));
    }
}
