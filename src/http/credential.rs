//! `POST /api/credential`: forward a digest to the anchor backend.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::error::{ApiError, ApiResult};
use crate::http::server::AppState;
use crate::http::{json_body, string_field, JsonBody};

/// Note placed in receipts when no backend is configured.
pub const UNANCHORED_NOTE: &str = "No ANCHOR_ENDPOINT configured; returning local receipt only.";

#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub ok: bool,
    pub hash: String,
    pub filename: Option<String>,
    pub anchored: bool,
    pub receipt: Value,
}

pub async fn issue(State(state): State<AppState>, body: JsonBody) -> ApiResult<Json<CredentialResponse>> {
    let body = json_body(body)?;
    let hash = string_field(&body, "hash");
    let filename = string_field(&body, "filename");

    if hash.is_empty() {
        return Err(ApiError::BadRequest("hash required".to_string()));
    }

    let Some(endpoint) = state.config.anchor.forward_endpoint.as_deref() else {
        return Ok(Json(CredentialResponse {
            ok: true,
            hash: hash.to_string(),
            filename: non_empty(filename),
            anchored: false,
            receipt: json!({ "note": UNANCHORED_NOTE }),
        }));
    };

    tracing::debug!(endpoint = %endpoint, "Forwarding credential to anchor backend");
    let response = state
        .http
        .post(endpoint)
        .json(&json!({ "hash": hash, "filename": filename }))
        .send()
        .await
        .map_err(|e| ApiError::Upstream {
            error: format!("anchor backend unreachable: {}", e),
            detail: None,
        })?;

    let status = response.status();
    let text = response.text().await.map_err(|e| ApiError::Upstream {
        error: format!("anchor backend response unreadable: {}", e),
        detail: None,
    })?;
    let data: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

    let upstream_ok = data.get("ok").and_then(Value::as_bool).unwrap_or(false);
    if !status.is_success() || !upstream_ok {
        let error = data
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("anchor failed")
            .to_string();
        tracing::warn!(status = status.as_u16(), error = %error, "Anchor backend refused credential");
        return Err(ApiError::Upstream {
            error,
            detail: Some(text),
        });
    }

    Ok(Json(CredentialResponse {
        ok: true,
        hash: hash.to_string(),
        filename: non_empty(filename),
        anchored: true,
        receipt: data,
    }))
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
