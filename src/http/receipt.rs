//! `POST /api/receipt` and `GET /api/receipt?txHash=`.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::error::{ApiError, ApiResult};
use crate::http::server::AppState;
use crate::http::{json_body, string_field, JsonBody};
use crate::receipt::StoredReceipt;

#[derive(Debug, Serialize)]
pub struct StoreResponse {
    pub ok: bool,
}

pub async fn store(State(state): State<AppState>, body: JsonBody) -> ApiResult<Json<StoreResponse>> {
    let body = json_body(body)?;
    let fields = ["txHash", "did", "hash", "filename"].map(|name| string_field(&body, name));
    if fields.iter().any(|f| f.is_empty()) {
        return Err(ApiError::BadRequest("missing fields".to_string()));
    }
    let [tx_hash, did, hash, filename] = fields;

    state.receipts.put(tx_hash, did, hash, filename);
    tracing::debug!(tx_hash = %tx_hash, "Receipt stored");
    Ok(Json(StoreResponse { ok: true }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchQuery {
    pub tx_hash: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub ok: bool,
    pub receipt: StoredReceipt,
}

pub async fn fetch(
    State(state): State<AppState>,
    Query(query): Query<FetchQuery>,
) -> ApiResult<Json<FetchResponse>> {
    query
        .tx_hash
        .as_deref()
        .and_then(|tx_hash| state.receipts.get(tx_hash))
        .map(|receipt| Json(FetchResponse { ok: true, receipt }))
        .ok_or_else(|| ApiError::NotFound("not found".to_string()))
}
