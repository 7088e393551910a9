//! `POST /api/verify` and `POST /api/verify/file`.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::hashing::SourceDescriptor;
use crate::http::error::ApiResult;
use crate::http::server::AppState;
use crate::http::{json_body, string_field, JsonBody};
use crate::verify::{compare, placeholder_validity, VerifyStatus};

#[derive(Debug, Serialize)]
pub struct PayloadCheckResponse {
    pub ok: bool,
    pub message: String,
}

/// Placeholder credential check; see [`placeholder_validity`].
pub async fn verify_payload(body: JsonBody) -> (StatusCode, Json<PayloadCheckResponse>) {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(e) => {
            return (
                e.status(),
                Json(PayloadCheckResponse {
                    ok: false,
                    message: e.to_string(),
                }),
            )
        }
    };

    let payload = string_field(&body, "payload");
    if payload.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(PayloadCheckResponse {
                ok: false,
                message: "Missing payload".to_string(),
            }),
        );
    }

    let check = placeholder_validity(payload);
    (
        StatusCode::OK,
        Json(PayloadCheckResponse {
            ok: check.ok,
            message: check.message.to_string(),
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct VerifyFileQuery {
    pub hash: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyFileResponse {
    pub ok: bool,
    pub status: VerifyStatus,
    /// Digest of the uploaded bytes.
    pub hash: String,
}

/// Hash the raw request body and compare it with `?hash=`.
pub async fn verify_file(
    State(state): State<AppState>,
    Query(query): Query<VerifyFileQuery>,
    body: Bytes,
) -> ApiResult<Json<VerifyFileResponse>> {
    if body.is_empty() {
        return Err(crate::hashing::HashError::NoInput.into());
    }
    let content = state.hasher.hash_bytes(&body, SourceDescriptor::LocalFile)?;
    let status = compare(query.hash.as_deref(), &content.digest);
    tracing::debug!(status = status.as_str(), bytes = content.byte_len, "File verified");

    Ok(Json(VerifyFileResponse {
        ok: true,
        status,
        hash: content.digest.to_string(),
    }))
}
