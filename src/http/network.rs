//! `GET /api/network?did=` and `GET /api/qr?hash=&did=&tx=`.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::error::{ApiError, ApiResult};
use crate::http::server::AppState;
use crate::identity::Did;
use crate::receipt::{qr_svg, verification_url};

#[derive(Debug, Deserialize)]
pub struct NetworkQuery {
    pub did: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NetworkResponse {
    pub ok: bool,
    pub did: String,
    pub method: String,
    pub network: String,
    pub endpoint: String,
}

/// Resolve a `did:<method>:<network>` to its RPC endpoint.
pub async fn resolve(
    State(state): State<AppState>,
    Query(query): Query<NetworkQuery>,
) -> ApiResult<Json<NetworkResponse>> {
    let raw = query
        .did
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("did required".to_string()))?;
    let did: Did = raw.parse()?;
    let network = state.networks.resolve(&did)?;

    Ok(Json(NetworkResponse {
        ok: true,
        did: did.to_string(),
        method: network.method.clone(),
        network: network.name.clone(),
        endpoint: network.endpoint.clone(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct QrQuery {
    pub hash: Option<String>,
    pub did: Option<String>,
    pub tx: Option<String>,
}

/// SVG QR code of the verification link.
pub async fn qr(State(state): State<AppState>, Query(query): Query<QrQuery>) -> ApiResult<impl IntoResponse> {
    let hash = query
        .hash
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("hash required".to_string()))?;

    let url = verification_url(
        &state.config.anchor.public_base_url,
        &hash,
        query.did.as_deref(),
        query.tx.as_deref(),
    )?;
    let svg = qr_svg(url.as_str())?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}
