//! `GET /api/health` and `GET /api/chain`.

use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::blockchain::ChainError;
use crate::http::error::ApiResult;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub ts: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfoResponse {
    pub ok: bool,
    pub chain_id: u64,
    pub client_version: String,
    pub best_block: u64,
    pub syncing: bool,
    pub endpoint: String,
}

/// Node connectivity check.
pub async fn chain_info(State(state): State<AppState>) -> ApiResult<Json<ChainInfoResponse>> {
    let chain = state
        .chain
        .as_ref()
        .ok_or_else(|| ChainError::NotAvailable("no node connection".to_string()))?;

    let info = chain.node_info().await?;
    chain.is_healthy().await;

    Ok(Json(ChainInfoResponse {
        ok: true,
        chain_id: info.chain_id,
        client_version: info.client_version,
        best_block: info.best_block,
        syncing: info.syncing,
        endpoint: chain.transport().endpoint().to_string(),
    }))
}
