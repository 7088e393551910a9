//! Node transport with timeout, failover and error handling.
//!
//! # Responsibilities
//! - Connect to the node RPC endpoint (http(s) or ws(s))
//! - Query chain state (health, balances, receipts, block contents)
//! - Sign and broadcast remark transactions
//! - Handle timeouts and network errors gracefully

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy::consensus::Transaction as _;
use alloy::network::{TransactionBuilder, TransactionResponse as _};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{BlockNumberOrTag, SyncStatus, TransactionReceipt, TransactionRequest};
use alloy::transports::TransportResult;
use async_trait::async_trait;
use tokio::time::timeout;

use crate::blockchain::signer::TransactionSigner;
use crate::blockchain::types::{
    BlockRef, ChainError, ChainResult, DispatchFailure, Inclusion, NodeHealth, NodeInfo,
    RemarkEvent,
};
use crate::config::ChainConfig;

/// Base cost of any transaction.
const TX_BASE_GAS: u64 = 21_000;
/// Calldata cost per zero byte.
const ZERO_BYTE_GAS: u64 = 4;
/// Calldata cost per non-zero byte.
const NONZERO_BYTE_GAS: u64 = 16;

/// Everything the submission pipeline needs from a node.
#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// Endpoint label for logs and metrics.
    fn endpoint(&self) -> &str;

    /// Whether the node is mid-resync.
    async fn node_health(&self) -> ChainResult<NodeHealth>;

    /// Chain ID, client version and head of the node.
    async fn node_info(&self) -> ChainResult<NodeInfo>;

    /// Spendable balance of `account`.
    async fn free_balance(&self, account: Address) -> ChainResult<U256>;

    /// Build a remark transaction carrying `remark`, sign it with `signer`
    /// and hand it to the node. Returns once the node accepted it.
    async fn broadcast(&self, remark: Bytes, signer: &dyn TransactionSigner) -> ChainResult<TxHash>;

    /// Where `tx_hash` was included, if it was.
    async fn inclusion(&self, tx_hash: TxHash) -> ChainResult<Option<Inclusion>>;

    /// Current head block number.
    async fn best_block_number(&self) -> ChainResult<u64>;

    /// Latest block the network reports as final, or `None` when the node
    /// does not expose a finalized head.
    async fn finalized_block_number(&self) -> ChainResult<Option<u64>>;

    /// Read back the remark at position `index` of `block`.
    async fn remark_at(&self, block: &BlockRef, index: u64) -> ChainResult<Option<RemarkEvent>>;
}

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Node transport over alloy providers (primary + read-only failovers).
#[derive(Clone)]
pub struct AlloyTransport {
    providers: Vec<DynProvider>,
    endpoint: String,
    chain_id: u64,
    timeout_duration: Duration,
    gas_price_multiplier: f64,
    max_gas_price_gwei: u64,
    /// Whether the primary node answers the `finalized` block tag.
    finalized_tag: bool,
}

impl AlloyTransport {
    /// Open sessions to the configured endpoints.
    ///
    /// Fails with [`ChainError::Connection`] if the primary endpoint cannot
    /// be reached within the connect timeout; failover endpoints that fail
    /// are skipped with a warning.
    pub async fn connect(config: &ChainConfig) -> ChainResult<Self> {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        let mut providers = vec![open_provider(&config.endpoint, connect_timeout).await?];

        for url in &config.failover_endpoints {
            match open_provider(url, connect_timeout).await {
                Ok(provider) => providers.push(provider),
                Err(e) => tracing::warn!(url = %url, error = %e, "Ignoring unreachable failover endpoint"),
            }
        }

        let mut transport = Self {
            providers,
            endpoint: config.endpoint.clone(),
            chain_id: config.chain_id,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            gas_price_multiplier: config.gas_price_multiplier,
            max_gas_price_gwei: config.max_gas_price_gwei,
            finalized_tag: false,
        };

        transport.verify_chain_id().await?;
        transport.finalized_tag = transport.probe_finalized_tag().await;

        tracing::info!(
            endpoint = %config.endpoint,
            chain_id = config.chain_id,
            failovers = transport.providers.len() - 1,
            finalized_tag = transport.finalized_tag,
            "Chain transport connected"
        );
        Ok(transport)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let actual = self
            .call("get chain id", |p| async move { p.get_chain_id().await })
            .await
            .map_err(|e| ChainError::Connection(format!("handshake failed: {}", e)))?;
        if actual != self.chain_id {
            return Err(ChainError::ChainMismatch {
                expected: self.chain_id,
                actual,
            });
        }
        Ok(())
    }

    /// Whether the node reports a finalized head. Nodes that do not are
    /// tracked by confirmation depth instead.
    async fn probe_finalized_tag(&self) -> bool {
        match self.query_finalized().await {
            Ok(Some(_)) => true,
            Ok(None) | Err(_) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    "Node reports no finalized head; falling back to confirmation depth"
                );
                false
            }
        }
    }

    async fn query_finalized(&self) -> ChainResult<Option<u64>> {
        let block = self
            .call("get finalized block", |p| async move {
                p.get_block_by_number(BlockNumberOrTag::Finalized).await
            })
            .await?;
        Ok(block.map(|block| block.header.number))
    }

    /// Run `f` against each provider in turn until one answers in time.
    async fn call<T, F, Fut>(&self, what: &str, f: F) -> ChainResult<T>
    where
        T: Send,
        F: Fn(DynProvider) -> Fut + Send + Sync,
        Fut: Future<Output = TransportResult<T>> + Send,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, f(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, call = what, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, call = what, "RPC timeout, trying next provider");
                }
            }
        }
        Err(ChainError::Rpc(format!("All providers failed to {}", what)))
    }

    /// Gas price with the configured safety margin, capped.
    async fn gas_price(&self) -> ChainResult<u128> {
        let gas_price = self
            .call("get gas price", |p| async move { p.get_gas_price().await })
            .await?;
        let gas_price_gwei = gas_price / 1_000_000_000;

        if gas_price_gwei > self.max_gas_price_gwei as u128 {
            return Err(ChainError::GasPriceTooHigh {
                current_gwei: gas_price_gwei as u64,
                max_gwei: self.max_gas_price_gwei,
            });
        }

        Ok((gas_price as f64 * self.gas_price_multiplier) as u128)
    }

    /// Sign a remark at `nonce` and hand it to the primary node.
    async fn sign_and_send(
        &self,
        remark: Bytes,
        nonce: u64,
        gas_price: u128,
        gas_limit: u64,
        signer: &dyn TransactionSigner,
    ) -> ChainResult<TxHash> {
        let from = signer.address();
        // a zero-value self-transfer whose calldata is the remark
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(from)
            .with_value(U256::ZERO)
            .with_input(remark)
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_chain_id(self.chain_id)
            .with_gas_limit(gas_limit);

        let envelope = signer.sign_transaction(tx).await?;

        // broadcast goes to the primary only; there is no resubmission
        let fut = self.providers[0].send_tx_envelope(envelope);
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => Err(ChainError::Rejected(e.to_string())),
            Err(_) => Err(ChainError::Rpc(format!(
                "broadcast not acknowledged within {}s",
                self.timeout_duration.as_secs()
            ))),
        }
    }
}

async fn open_provider(endpoint: &str, connect_timeout: Duration) -> ChainResult<DynProvider> {
    match timeout(connect_timeout, ProviderBuilder::new().connect(endpoint)).await {
        Ok(Ok(provider)) => {
            let provider: DynProvider = Arc::new(provider);
            Ok(provider)
        }
        Ok(Err(e)) => Err(ChainError::Connection(format!("{}: {}", endpoint, e))),
        Err(_) => Err(ChainError::Connection(format!(
            "{}: no handshake within {}s",
            endpoint,
            connect_timeout.as_secs()
        ))),
    }
}

/// Intrinsic gas of a transaction carrying `data` as calldata.
pub fn intrinsic_gas(data: &[u8]) -> u64 {
    let zeros = data.iter().filter(|b| **b == 0).count() as u64;
    let nonzeros = data.len() as u64 - zeros;
    TX_BASE_GAS + zeros * ZERO_BYTE_GAS + nonzeros * NONZERO_BYTE_GAS
}

/// Turn a mined receipt into an inclusion record.
///
/// Returns `None` for receipts that are not yet attached to a block.
pub fn inclusion_from_receipt(receipt: &TransactionReceipt) -> Option<Inclusion> {
    let block = BlockRef {
        hash: receipt.block_hash?,
        number: receipt.block_number?,
    };
    let failure = if receipt.status() {
        None
    } else {
        Some(DispatchFailure::Module {
            section: "system".to_string(),
            name: "ExtrinsicFailed".to_string(),
            description: format!(
                "execution reverted in block {} after using {} gas",
                block.number, receipt.gas_used
            ),
        })
    };
    Some(Inclusion {
        block,
        index: receipt.transaction_index.unwrap_or_default(),
        failure,
    })
}

#[async_trait]
impl ChainTransport for AlloyTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn node_health(&self) -> ChainResult<NodeHealth> {
        let status = self
            .call("get sync status", |p| async move { p.syncing().await })
            .await?;
        Ok(NodeHealth {
            syncing: !matches!(status, SyncStatus::None),
        })
    }

    async fn node_info(&self) -> ChainResult<NodeInfo> {
        let chain_id = self
            .call("get chain id", |p| async move { p.get_chain_id().await })
            .await?;
        let client_version = self
            .call("get client version", |p| async move { p.get_client_version().await })
            .await?;
        let best_block = self.best_block_number().await?;
        let health = self.node_health().await?;
        Ok(NodeInfo {
            chain_id,
            client_version,
            best_block,
            syncing: health.syncing,
        })
    }

    async fn free_balance(&self, account: Address) -> ChainResult<U256> {
        self.call("get balance", move |p| async move { p.get_balance(account).await })
            .await
    }

    async fn broadcast(&self, remark: Bytes, signer: &dyn TransactionSigner) -> ChainResult<TxHash> {
        let from = signer.address();
        let chain_nonce = self
            .call("get transaction count", move |p| async move {
                p.get_transaction_count(from).pending().await
            })
            .await?;
        let gas_price = self.gas_price().await?;
        let gas_limit = intrinsic_gas(&remark);

        let nonce = signer.next_nonce(chain_nonce);
        match self.sign_and_send(remark, nonce, gas_price, gas_limit, signer).await {
            Ok(tx_hash) => {
                tracing::info!(tx_hash = %tx_hash, from = %from, nonce, gas_limit, "Transaction broadcast");
                Ok(tx_hash)
            }
            Err(e) => {
                signer.release_nonce(nonce);
                Err(e)
            }
        }
    }

    async fn inclusion(&self, tx_hash: TxHash) -> ChainResult<Option<Inclusion>> {
        let receipt = self
            .call("get receipt", move |p| async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await?;
        Ok(receipt.as_ref().and_then(inclusion_from_receipt))
    }

    async fn best_block_number(&self) -> ChainResult<u64> {
        self.call("get block number", |p| async move { p.get_block_number().await })
            .await
    }

    async fn finalized_block_number(&self) -> ChainResult<Option<u64>> {
        if !self.finalized_tag {
            return Ok(None);
        }
        self.query_finalized().await
    }

    async fn remark_at(&self, block: &BlockRef, index: u64) -> ChainResult<Option<RemarkEvent>> {
        let block_hash = block.hash;
        let tx = self
            .call("get transaction by block and index", move |p| async move {
                p.get_transaction_by_block_hash_and_index(block_hash, index as usize)
                    .await
            })
            .await?;
        Ok(tx.map(|tx| RemarkEvent {
            sender: tx.from(),
            data: tx.input().clone(),
        }))
    }
}

impl std::fmt::Debug for AlloyTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyTransport")
            .field("endpoint", &self.endpoint)
            .field("chain_id", &self.chain_id)
            .field("providers", &self.providers.len())
            .field("finalized_tag", &self.finalized_tag)
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}
