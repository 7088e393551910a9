//! Chain client: preflight checks, broadcast and lifecycle tracking.
//!
//! # Responsibilities
//! - Connect to the configured node
//! - Refuse to broadcast against a syncing node or an underfunded signer
//! - Hand every broadcast transaction to its own tracker
//! - Provide health check for node connectivity

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};

use crate::blockchain::signer::TransactionSigner;
use crate::blockchain::submission::{SubmissionHandle, SubmissionSettings};
use crate::blockchain::transport::{AlloyTransport, ChainTransport};
use crate::blockchain::types::{ChainError, ChainResult, NodeInfo};
use crate::config::ChainConfig;
use crate::observability::metrics;

/// Entry point for submitting remarks to one chain.
#[derive(Clone)]
pub struct ChainClient {
    transport: Arc<dyn ChainTransport>,
    settings: SubmissionSettings,
}

impl ChainClient {
    /// Connect to the node configured in `config`.
    ///
    /// # Returns
    /// A client, or [`ChainError::Connection`] on timeout or handshake failure
    pub async fn connect(config: &ChainConfig) -> ChainResult<Self> {
        if !config.enabled {
            return Err(ChainError::NotAvailable("chain access is disabled".to_string()));
        }
        let transport = AlloyTransport::connect(config).await?;
        Ok(Self::with_transport(Arc::new(transport), SubmissionSettings::from(config)))
    }

    /// Build a client over an existing transport.
    pub fn with_transport(transport: Arc<dyn ChainTransport>, settings: SubmissionSettings) -> Self {
        Self { transport, settings }
    }

    pub fn transport(&self) -> &Arc<dyn ChainTransport> {
        &self.transport
    }

    pub fn settings(&self) -> &SubmissionSettings {
        &self.settings
    }

    /// Check node connectivity and record it.
    pub async fn is_healthy(&self) -> bool {
        let healthy = match self.transport.node_health().await {
            Ok(health) => !health.syncing,
            Err(e) => {
                tracing::warn!(endpoint = self.transport.endpoint(), error = %e, "Node health check failed");
                false
            }
        };
        metrics::record_node_health(self.transport.endpoint(), healthy);
        healthy
    }

    pub async fn node_info(&self) -> ChainResult<NodeInfo> {
        self.transport.node_info().await
    }

    /// Preconditions for broadcasting from `account`.
    pub async fn ensure_ready(&self, account: Address) -> ChainResult<()> {
        if self.transport.node_health().await?.syncing {
            return Err(ChainError::NodeSyncing);
        }

        let free = self.transport.free_balance(account).await?;
        if free < self.settings.min_free_balance {
            return Err(ChainError::InsufficientFunds {
                free,
                required: self.settings.min_free_balance,
            });
        }
        Ok(())
    }

    /// Sign and broadcast a remark carrying `remark`, then track it.
    ///
    /// Nothing is broadcast if a precondition fails. There is no
    /// automatic retry once the node has the transaction.
    pub async fn submit(&self, remark: Bytes, signer: &dyn TransactionSigner) -> ChainResult<SubmissionHandle> {
        let account = signer.address();
        self.ensure_ready(account).await?;

        let tx_hash = self.transport.broadcast(remark, signer).await?;
        tracing::info!(tx_hash = %tx_hash, account = %account, "Remark submitted");

        Ok(SubmissionHandle::spawn(
            self.transport.clone(),
            tx_hash,
            self.settings.clone(),
        ))
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("endpoint", &self.transport.endpoint())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::scripted::ScriptedTransport;
    use crate::blockchain::signer::AnchorSigner;
    use crate::blockchain::submission::SubmissionUpdate;
    use crate::blockchain::types::LifecycleStatus;
    use alloy::primitives::U256;
    use std::time::Duration;

    fn client(transport: ScriptedTransport) -> (ChainClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let settings = SubmissionSettings {
            poll_interval: Duration::from_millis(5),
            stall_after: Duration::from_secs(5),
            finality_depth: 1,
            min_free_balance: U256::from(1_000u64),
        };
        (ChainClient::with_transport(transport.clone(), settings), transport)
    }

    #[tokio::test]
    async fn test_syncing_node_blocks_submit() {
        let (client, transport) = client(ScriptedTransport::new().syncing(true));
        let signer = AnchorSigner::from_uri("//Alice").unwrap();

        let err = client.submit(Bytes::from_static(b"x"), &signer).await.unwrap_err();
        assert!(matches!(err, ChainError::NodeSyncing));
        assert!(transport.broadcasts().is_empty());
        assert!(!client.is_healthy().await);
    }

    #[tokio::test]
    async fn test_insufficient_funds_blocks_submit() {
        let (client, transport) = client(ScriptedTransport::new().balance(U256::from(999u64)));
        let signer = AnchorSigner::from_uri("//Alice").unwrap();

        let err = client.submit(Bytes::from_static(b"x"), &signer).await.unwrap_err();
        match err {
            ChainError::InsufficientFunds { free, required } => {
                assert_eq!(free, U256::from(999u64));
                assert_eq!(required, U256::from(1_000u64));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(transport.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn test_submit_broadcasts_and_tracks() {
        let (client, transport) = client(ScriptedTransport::happy_path());
        let signer = AnchorSigner::from_uri("//Alice").unwrap();

        let mut handle = client.submit(Bytes::from_static(b"remark"), &signer).await.unwrap();
        assert_eq!(
            handle.recv().await,
            Some(SubmissionUpdate::Status(LifecycleStatus::Broadcast))
        );
        assert_eq!(transport.broadcasts().len(), 1);
        assert!(client.is_healthy().await);
    }

    #[tokio::test]
    async fn test_connect_disabled() {
        let config = ChainConfig {
            enabled: false,
            ..ChainConfig::default()
        };
        let err = ChainClient::connect(&config).await.unwrap_err();
        assert!(matches!(err, ChainError::NotAvailable(_)));
    }
}
