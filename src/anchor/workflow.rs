//! End-to-end anchoring: hash → wallet → submit → status → receipt.

use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::{Bytes, TxHash};
use thiserror::Error;
use url::Url;

use crate::anchor::payload::AnchorPayload;
use crate::blockchain::{BlockRef, ChainClient, ChainError, DispatchFailure, SubmissionState};
use crate::config::AppConfig;
use crate::hashing::{ContentHasher, HashError, HashedContent};
use crate::receipt::{verification_url, Receipt, ReceiptError};
use crate::status::{RemarkContent, StatusReducer};
use crate::wallet::{WalletConnection, WalletConnector, WalletError};

pub const STATUS_HASH_READY: &str = "Hash ready.";

#[derive(Debug, Error)]
pub enum AnchorError {
    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Receipt(#[from] ReceiptError),
}

/// What to hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorSource {
    File(PathBuf),
    Url(String),
}

#[derive(Debug, Clone)]
pub struct AnchorRequest {
    pub source: AnchorSource,
    /// Included in the verification link when set.
    pub did: Option<String>,
    /// Wallet provider name; the preferred provider when `None`.
    pub wallet: Option<String>,
    /// Key for wallet auto-reconnect.
    pub session_id: String,
}

/// Everything produced by one run.
#[derive(Debug)]
pub struct AnchorOutcome {
    pub content: HashedContent,
    pub payload: AnchorPayload,
    pub tx_hash: TxHash,
    pub state: SubmissionState,
    /// Last status line shown to the user.
    pub status: String,
    pub remark: Option<RemarkContent>,
    pub receipt: Receipt,
    pub verification_url: Url,
    pub explorer: String,
}

impl AnchorOutcome {
    pub fn finalized_block(&self) -> Option<BlockRef> {
        match self.state {
            SubmissionState::Finalized(block) => Some(block),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&DispatchFailure> {
        match &self.state {
            SubmissionState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// `<explorer_url><txHash>`
pub fn explorer_link(explorer_url: &str, tx_hash: &TxHash) -> String {
    format!("{}{}", explorer_url, tx_hash)
}

/// Drives one anchoring flow against a connected chain.
pub struct AnchorWorkflow {
    client: ChainClient,
    hasher: ContentHasher,
    wallets: Arc<WalletConnector>,
    chain_name: String,
    explorer_url: String,
    public_base_url: String,
}

impl AnchorWorkflow {
    pub fn new(
        client: ChainClient,
        hasher: ContentHasher,
        wallets: Arc<WalletConnector>,
        config: &AppConfig,
    ) -> Self {
        Self {
            client,
            hasher,
            wallets,
            chain_name: config.chain.network.clone(),
            explorer_url: config.chain.explorer_url.clone(),
            public_base_url: config.anchor.public_base_url.clone(),
        }
    }

    pub async fn hash(&self, source: &AnchorSource) -> Result<HashedContent, HashError> {
        match source {
            AnchorSource::File(path) => self.hasher.hash_file(path).await,
            AnchorSource::Url(url) if url.trim().is_empty() => Err(HashError::NoInput),
            AnchorSource::Url(url) => self.hasher.hash_url(url.trim()).await,
        }
    }

    /// Reuse the session's wallet if possible, otherwise ask for access.
    pub async fn wallet(
        &self,
        session_id: &str,
        provider: Option<&str>,
    ) -> Result<WalletConnection, WalletError> {
        if let Some(connection) = self.wallets.reconnect(session_id).await {
            if provider.map_or(true, |p| p == connection.provider) {
                return Ok(connection);
            }
        }
        self.wallets.connect(session_id, provider).await
    }

    /// Run the whole flow, reporting every status line through `on_status`.
    ///
    /// A dispatch error is not an `Err`: it ends the run with a failed
    /// [`SubmissionState`] and a pending receipt.
    pub async fn run<F>(&self, request: &AnchorRequest, mut on_status: F) -> Result<AnchorOutcome, AnchorError>
    where
        F: FnMut(&str),
    {
        let content = self.hash(&request.source).await?;
        on_status(STATUS_HASH_READY);

        let connection = self.wallet(&request.session_id, request.wallet.as_deref()).await?;
        on_status(&connection.status_line());

        let payload = AnchorPayload::for_content(&content);
        let mut reducer = StatusReducer::new();
        on_status(reducer.status());

        let mut handle = self
            .client
            .submit(Bytes::from(payload.to_bytes()), connection.signer.as_ref())
            .await?;
        let tx_hash = handle.tx_hash();

        reducer
            .consume(&mut handle, self.client.transport().as_ref(), &mut on_status)
            .await;

        let receipt = Receipt::new(
            &self.chain_name,
            tx_hash,
            reducer.finalized_block(),
            connection.account,
            payload.clone(),
        );
        let tx = tx_hash.to_string();
        let verification_url = verification_url(
            &self.public_base_url,
            &content.digest.to_string(),
            request.did.as_deref(),
            Some(&tx),
        )?;

        Ok(AnchorOutcome {
            content,
            payload,
            tx_hash,
            state: reducer.state().clone(),
            status: reducer.status().to_string(),
            remark: reducer.remark().cloned(),
            receipt,
            verification_url,
            explorer: explorer_link(&self.explorer_url, &tx_hash),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::scripted::{block_ref, ScriptedTransport};
    use crate::blockchain::SubmissionSettings;
    use crate::config::{WalletConfig, WalletProviderConfig};
    use alloy::primitives::U256;
    use std::time::Duration;

    fn workflow(transport: ScriptedTransport) -> AnchorWorkflow {
        let settings = SubmissionSettings {
            poll_interval: Duration::from_millis(5),
            stall_after: Duration::from_secs(30),
            finality_depth: 1,
            min_free_balance: U256::ZERO,
        };
        let client = ChainClient::with_transport(Arc::new(transport), settings);
        let wallets = WalletConnector::from_config(&WalletConfig {
            providers: vec![WalletProviderConfig {
                name: "local".into(),
                key_uris: vec!["//Charlie".into()],
            }],
            session_ttl_secs: 60,
        })
        .unwrap();
        AnchorWorkflow::new(client, ContentHasher::default(), Arc::new(wallets), &AppConfig::default())
    }

    async fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("stitch-{}-{}", std::process::id(), name));
        tokio::fs::write(&path, contents).await.unwrap();
        path
    }

    fn request(path: PathBuf) -> AnchorRequest {
        AnchorRequest {
            source: AnchorSource::File(path),
            did: Some("did:polkadot:westend".into()),
            wallet: None,
            session_id: "test".into(),
        }
    }

    #[tokio::test]
    async fn test_run_to_finality() {
        let path = temp_file("final.bin", b"anchor me").await;
        let workflow = workflow(ScriptedTransport::new().head_at(5).then_pending(1).then_included(6));

        let mut lines = Vec::new();
        let outcome = workflow
            .run(&request(path.clone()), |s| lines.push(s.to_string()))
            .await
            .unwrap();

        assert_eq!(lines[0], STATUS_HASH_READY);
        assert!(lines[1].starts_with("Wallet connected: "));
        assert!(lines.last().unwrap().starts_with("Finalized in block"));

        assert_eq!(outcome.finalized_block(), Some(block_ref(6)));
        assert_eq!(outcome.receipt.finalized_block, block_ref(6).hash.to_string());
        assert_eq!(outcome.receipt.payload.url, "(local file)");
        assert_eq!(outcome.remark, Some(RemarkContent::Anchor(outcome.payload.clone())));
        assert!(outcome.explorer.ends_with(&outcome.tx_hash.to_string()));

        let query: Vec<(String, String)> = outcome.verification_url.query_pairs().into_owned().collect();
        assert_eq!(query[0], ("hash".to_string(), outcome.content.digest.to_string()));
        assert_eq!(query[1].1, "did:polkadot:westend");
        assert_eq!(query[2].1, outcome.tx_hash.to_string());

        tokio::fs::remove_file(path).await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_error_leaves_pending_receipt() {
        let path = temp_file("fail.bin", b"anchor me too").await;
        let failure = DispatchFailure::Other { message: "BadOrigin".into() };
        let workflow = workflow(ScriptedTransport::new().then_failed(2, failure.clone()));

        let outcome = workflow.run(&request(path.clone()), |_| {}).await.unwrap();
        assert_eq!(outcome.failure(), Some(&failure));
        assert_eq!(outcome.status, "On-chain error: BadOrigin");
        assert!(!outcome.receipt.is_final());

        tokio::fs::remove_file(path).await.unwrap();
    }

    #[tokio::test]
    async fn test_precondition_failure_is_error() {
        let path = temp_file("sync.bin", b"x").await;
        let workflow = workflow(ScriptedTransport::new().syncing(true));

        let err = workflow.run(&request(path.clone()), |_| {}).await.unwrap_err();
        assert!(matches!(err, AnchorError::Chain(ChainError::NodeSyncing)));

        tokio::fs::remove_file(path).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_url_is_no_input() {
        let workflow = workflow(ScriptedTransport::new());
        let err = workflow.hash(&AnchorSource::Url("  ".into())).await.unwrap_err();
        assert!(matches!(err, HashError::NoInput));
    }
}
