//! Lifecycle updates → human-readable status.

use alloy::primitives::{Bytes, TxHash};

use crate::anchor::AnchorPayload;
use crate::blockchain::types::{BlockRef, ChainResult, LifecycleStatus};
use crate::blockchain::{ChainTransport, SubmissionHandle, SubmissionState, SubmissionUpdate};

pub const STATUS_CONNECTING: &str = "Connecting to chain…";
pub const STATUS_SUBMITTING: &str = "Submitting transaction… (broadcasting)";
pub const STATUS_BROADCAST: &str = "Broadcasted… waiting for inclusion";
pub const STATUS_STILL_WAITING: &str = "Still waiting for inclusion… try again or switch RPC.";

/// What was found in the remark on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemarkContent {
    Anchor(AnchorPayload),
    /// Not an anchor record; kept verbatim.
    Raw(Bytes),
}

impl RemarkContent {
    pub fn decode(data: Bytes) -> Self {
        match AnchorPayload::from_bytes(&data) {
            Ok(payload) => RemarkContent::Anchor(payload),
            Err(_) => RemarkContent::Raw(data),
        }
    }
}

/// Folds a submission's updates into the latest status line.
#[derive(Debug, Clone)]
pub struct StatusReducer {
    status: String,
    state: SubmissionState,
    remark: Option<RemarkContent>,
}

impl Default for StatusReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReducer {
    pub fn new() -> Self {
        Self {
            status: STATUS_SUBMITTING.to_string(),
            state: SubmissionState::Building,
            remark: None,
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Block the transaction was finalized in, if it was.
    pub fn finalized_block(&self) -> Option<BlockRef> {
        match self.state {
            SubmissionState::Finalized(block) => Some(block),
            _ => None,
        }
    }

    pub fn remark(&self) -> Option<&RemarkContent> {
        self.remark.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.state.is_terminal()
    }

    /// Apply one update. Returns `true` if the status line changed.
    pub fn reduce(&mut self, update: &SubmissionUpdate) -> bool {
        let next = match update {
            SubmissionUpdate::StillWaiting { .. } => {
                // only meaningful until the transaction lands
                if self.state.block().is_some() || self.state.is_terminal() {
                    return false;
                }
                STATUS_STILL_WAITING.to_string()
            }
            SubmissionUpdate::Status(status) => {
                if !self.state.apply(status) {
                    return false;
                }
                match status {
                    LifecycleStatus::Broadcast => STATUS_BROADCAST.to_string(),
                    LifecycleStatus::InBlock(block) => format!("Included in block: {}", block),
                    LifecycleStatus::Finalized(block) => format!("Finalized in block {}", block),
                    LifecycleStatus::DispatchError(failure) => format!("On-chain error: {}", failure),
                }
            }
        };
        self.status = next;
        true
    }

    /// Drain `handle` until it ends, calling `on_change` with every new
    /// status line. On finality the remark is read back from the chain;
    /// a failed lookup is logged and otherwise ignored.
    pub async fn consume<F>(
        &mut self,
        handle: &mut SubmissionHandle,
        transport: &dyn ChainTransport,
        mut on_change: F,
    ) where
        F: FnMut(&str),
    {
        while let Some(update) = handle.recv().await {
            if !self.reduce(&update) {
                continue;
            }
            on_change(&self.status);

            if let Some(block) = self.finalized_block() {
                match lookup_remark(transport, handle.tx_hash(), &block).await {
                    Ok(Some(remark)) => self.remark = Some(remark),
                    Ok(None) => {
                        tracing::warn!(tx_hash = %handle.tx_hash(), block = %block, "Remark not found in finalized block")
                    }
                    Err(e) => {
                        tracing::warn!(tx_hash = %handle.tx_hash(), error = %e, "Remark lookup failed")
                    }
                }
            }
            if self.is_done() {
                break;
            }
        }
    }
}

/// Read the remark back by block and position within the block.
async fn lookup_remark(
    transport: &dyn ChainTransport,
    tx_hash: TxHash,
    block: &BlockRef,
) -> ChainResult<Option<RemarkContent>> {
    let Some(inclusion) = transport.inclusion(tx_hash).await? else {
        return Ok(None);
    };
    if inclusion.block != *block {
        return Ok(None);
    }
    let event = transport.remark_at(block, inclusion.index).await?;
    Ok(event.map(|event| RemarkContent::decode(event.data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::scripted::{block_ref, ScriptedTransport};
    use crate::blockchain::types::DispatchFailure;
    use crate::blockchain::{AnchorSigner, SubmissionSettings};
    use crate::hashing::{ContentHasher, SourceDescriptor};
    use alloy::primitives::U256;
    use std::sync::Arc;
    use std::time::Duration;

    fn settings() -> SubmissionSettings {
        SubmissionSettings {
            poll_interval: Duration::from_millis(5),
            stall_after: Duration::from_secs(30),
            finality_depth: 1,
            min_free_balance: U256::ZERO,
        }
    }

    #[test]
    fn test_status_strings() {
        let block = block_ref(9);
        let mut reducer = StatusReducer::new();
        assert_eq!(reducer.status(), STATUS_SUBMITTING);

        assert!(reducer.reduce(&SubmissionUpdate::Status(LifecycleStatus::Broadcast)));
        assert_eq!(reducer.status(), STATUS_BROADCAST);

        assert!(reducer.reduce(&SubmissionUpdate::Status(LifecycleStatus::InBlock(block))));
        assert_eq!(reducer.status(), format!("Included in block: {}", block.hash));

        // the stall hint never overwrites an inclusion
        assert!(!reducer.reduce(&SubmissionUpdate::StillWaiting { waited: Duration::from_secs(90) }));

        assert!(reducer.reduce(&SubmissionUpdate::Status(LifecycleStatus::Finalized(block))));
        assert!(reducer.status().starts_with("Finalized in block 0x"));
        assert_eq!(reducer.finalized_block(), Some(block));
    }

    #[test]
    fn test_dispatch_error_is_final() {
        let mut reducer = StatusReducer::new();
        reducer.reduce(&SubmissionUpdate::Status(LifecycleStatus::Broadcast));
        reducer.reduce(&SubmissionUpdate::StillWaiting { waited: Duration::from_secs(90) });
        assert_eq!(reducer.status(), STATUS_STILL_WAITING);

        let failure = DispatchFailure::Other { message: "BadOrigin".into() };
        assert!(reducer.reduce(&SubmissionUpdate::Status(LifecycleStatus::DispatchError(failure))));
        assert_eq!(reducer.status(), "On-chain error: BadOrigin");

        assert!(!reducer.reduce(&SubmissionUpdate::Status(LifecycleStatus::InBlock(block_ref(2)))));
        assert_eq!(reducer.status(), "On-chain error: BadOrigin");
        assert!(reducer.is_done());
    }

    #[test]
    fn test_remark_decode() {
        let content = ContentHasher::default()
            .hash_bytes(b"media", SourceDescriptor::LocalFile)
            .unwrap();
        let payload = AnchorPayload::for_content(&content);
        let decoded = RemarkContent::decode(Bytes::from(payload.to_bytes()));
        assert_eq!(decoded, RemarkContent::Anchor(payload));

        let raw = RemarkContent::decode(Bytes::from_static(b"hello"));
        assert_eq!(raw, RemarkContent::Raw(Bytes::from_static(b"hello")));
    }

    #[tokio::test]
    async fn test_consume_reads_back_remark() {
        let transport = Arc::new(ScriptedTransport::new().head_at(20).then_included(20));
        let signer = AnchorSigner::from_uri("//Alice").unwrap();
        let remark = Bytes::from_static(b"not json");
        let tx_hash = transport.broadcast(remark.clone(), &signer).await.unwrap();

        let mut handle = SubmissionHandle::spawn(transport.clone(), tx_hash, settings());
        let mut reducer = StatusReducer::new();
        let mut seen = Vec::new();
        reducer
            .consume(&mut handle, transport.as_ref(), |s| seen.push(s.to_string()))
            .await;

        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], STATUS_BROADCAST);
        assert!(seen[2].starts_with("Finalized in block"));
        assert_eq!(reducer.remark(), Some(&RemarkContent::Raw(remark)));
    }
}
