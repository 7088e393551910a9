//! `POST /api/anchor`: anchor a digest with the server-held key.

use std::time::Duration;

use alloy::primitives::Bytes;
use axum::{extract::State, Json};
use serde::Serialize;
use tokio::time::timeout;

use crate::anchor::explorer_link;
use crate::blockchain::{ChainError, LifecycleStatus, SubmissionUpdate};
use crate::hashing::Digest;
use crate::http::error::{ApiError, ApiResult};
use crate::http::server::AppState;
use crate::http::{json_body, string_field, JsonBody};
use crate::observability::metrics;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorResponse {
    pub ok: bool,
    pub tx_hash: String,
    pub block_hash: String,
    pub explorer: String,
}

/// Responds on the first inclusion (or finality) of the remark. The
/// tracker is dropped with the handle once the answer is known or the
/// inclusion deadline passes.
pub async fn anchor(State(state): State<AppState>, body: JsonBody) -> ApiResult<Json<AnchorResponse>> {
    let body = json_body(body)?;
    let digest: Digest = string_field(&body, "hash")
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid hash, must be 64 hex chars".to_string()))?;

    let chain = state
        .chain
        .as_ref()
        .ok_or_else(|| ChainError::NotAvailable("no node connection".to_string()))?;
    let signer = state
        .signer
        .as_ref()
        .ok_or_else(|| ChainError::NotAvailable("no anchor signer configured".to_string()))?;

    let mut handle = match chain.submit(Bytes::copy_from_slice(digest.as_bytes()), signer.as_ref()).await {
        Ok(handle) => handle,
        Err(e) => {
            metrics::record_anchor("rejected");
            return Err(e.into());
        }
    };
    let tx_hash = handle.tx_hash();
    let deadline = inclusion_deadline(state.config.timeouts.request_secs);

    let tracked = timeout(deadline, async {
        while let Some(update) = handle.recv().await {
            match update {
                SubmissionUpdate::Status(LifecycleStatus::InBlock(block))
                | SubmissionUpdate::Status(LifecycleStatus::Finalized(block)) => {
                    metrics::record_anchor("included");
                    tracing::info!(tx_hash = %tx_hash, block = %block, digest = %digest, "Digest anchored");
                    return Ok(Json(AnchorResponse {
                        ok: true,
                        tx_hash: tx_hash.to_string(),
                        block_hash: block.hash.to_string(),
                        explorer: explorer_link(&state.config.chain.explorer_url, &tx_hash),
                    }));
                }
                SubmissionUpdate::Status(LifecycleStatus::DispatchError(failure)) => {
                    metrics::record_anchor("dispatch_error");
                    return Err(ApiError::Internal(failure.to_string()));
                }
                SubmissionUpdate::Status(LifecycleStatus::Broadcast) => {}
                SubmissionUpdate::StillWaiting { waited } => {
                    tracing::warn!(tx_hash = %tx_hash, waited_secs = waited.as_secs(), "Anchor still waiting for inclusion");
                }
            }
        }

        metrics::record_anchor("abandoned");
        Err(ApiError::Internal(format!(
            "tracking of {} ended before inclusion",
            tx_hash
        )))
    })
    .await;

    tracked.unwrap_or_else(|_| {
        metrics::record_anchor("timeout");
        Err(ApiError::Internal(format!(
            "{} not included within {}ms",
            tx_hash,
            deadline.as_millis()
        )))
    })
}

/// Time to wait for inclusion: most of the request timeout, so the answer
/// is still a JSON error rather than the middleware's bare timeout.
fn inclusion_deadline(request_secs: u64) -> Duration {
    Duration::from_secs(request_secs).mul_f64(0.8)
}
