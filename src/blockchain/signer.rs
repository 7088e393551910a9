//! Transaction signing.
//!
//! # Security
//! - Key material comes from configuration or `ANCHOR_SIGNER_URI` only
//! - Keys are never logged or serialized

use alloy::consensus::TxEnvelope;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::blockchain::types::{ChainError, ChainResult};

/// Development key names and the well-known keys they stand for.
///
/// These keys are public; use them only against development networks.
const DEV_KEYS: &[(&str, &str)] = &[
    ("alice", "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"),
    ("bob", "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"),
    ("charlie", "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a"),
];

/// Anything that can sign a transaction for one account.
///
/// Implemented by the server-held key and by wallet providers.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// The signing account.
    fn address(&self) -> Address;

    /// Pick the nonce for the next transaction given the node's pending count.
    fn next_nonce(&self, chain_nonce: u64) -> u64 {
        chain_nonce
    }

    /// Hand back a nonce from [`next_nonce`](Self::next_nonce) whose
    /// transaction never reached the node.
    fn release_nonce(&self, _nonce: u64) {}

    /// Sign a fully populated request into a broadcastable envelope.
    async fn sign_transaction(&self, tx: TransactionRequest) -> ChainResult<TxEnvelope>;
}

/// A locally held private key with nonce tracking.
#[derive(Debug)]
pub struct AnchorSigner {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
    /// Next nonce to hand out for sequential transactions.
    nonce: Arc<AtomicU64>,
}

impl AnchorSigner {
    /// Create a signer from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> ChainResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ChainError::Signer(format!("Invalid private key format: {}", e)))?;

        tracing::info!(address = %signer.address(), "Signer initialized");

        Ok(Self {
            signer,
            nonce: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Create a signer from a key URI: a hex private key or a development
    /// name such as `//Alice`.
    pub fn from_uri(uri: &str) -> ChainResult<Self> {
        let uri = uri.trim();
        match uri.strip_prefix("//") {
            Some(name) => {
                let name = name.to_ascii_lowercase();
                let key = DEV_KEYS
                    .iter()
                    .find(|(dev, _)| *dev == name)
                    .map(|(_, key)| *key)
                    .ok_or_else(|| ChainError::Signer(format!("Unknown development key '//{}'", name)))?;
                Self::from_private_key(key)
            }
            None => Self::from_private_key(uri),
        }
    }

    /// Get the signer's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get current nonce without incrementing.
    pub fn current_nonce(&self) -> u64 {
        self.nonce.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionSigner for AnchorSigner {
    fn address(&self) -> Address {
        self.signer.address()
    }

    /// Never goes backwards, so concurrent submissions do not reuse a nonce
    /// the node has not seen yet.
    fn next_nonce(&self, chain_nonce: u64) -> u64 {
        self.nonce.fetch_max(chain_nonce, Ordering::SeqCst);
        self.nonce.fetch_add(1, Ordering::SeqCst)
    }

    /// Rolls the counter back if `nonce` is still the latest one handed out.
    /// Otherwise a later transaction already holds the next nonce and the
    /// counter resyncs from the node's pending count on the next send.
    fn release_nonce(&self, nonce: u64) {
        let rolled_back = self
            .nonce
            .compare_exchange(nonce.saturating_add(1), nonce, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if !rolled_back {
            tracing::warn!(nonce, address = %self.signer.address(), "Nonce released out of order");
        }
    }

    async fn sign_transaction(&self, tx: TransactionRequest) -> ChainResult<TxEnvelope> {
        let wallet = EthereumWallet::from(self.signer.clone());
        tx.build(&wallet)
            .await
            .map_err(|e| ChainError::Signer(format!("Signing failed: {}", e)))
    }
}

impl Clone for AnchorSigner {
    fn clone(&self) -> Self {
        Self {
            signer: self.signer.clone(),
            nonce: self.nonce.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Bytes, U256};

    // Well-known development key (first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_signer_from_private_key() {
        let signer = AnchorSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(signer.address().to_string().to_lowercase(), TEST_ADDRESS);
    }

    #[test]
    fn test_signer_with_0x_prefix() {
        let signer = AnchorSigner::from_private_key(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(signer.address().to_string().to_lowercase(), TEST_ADDRESS);
    }

    #[test]
    fn test_dev_uri() {
        let alice = AnchorSigner::from_uri("//Alice").unwrap();
        assert_eq!(alice.address().to_string().to_lowercase(), TEST_ADDRESS);

        let bob = AnchorSigner::from_uri("//bob").unwrap();
        assert_eq!(
            bob.address().to_string().to_lowercase(),
            "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
        );

        let err = AnchorSigner::from_uri("//Mallory").unwrap_err();
        assert!(err.to_string().contains("Unknown development key"));
    }

    #[test]
    fn test_nonce_management() {
        let signer = AnchorSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();

        assert_eq!(signer.current_nonce(), 0);
        assert_eq!(signer.next_nonce(5), 5);
        // chain has not caught up yet: keep counting locally
        assert_eq!(signer.next_nonce(5), 6);
        assert_eq!(signer.next_nonce(10), 10);
        assert_eq!(signer.current_nonce(), 11);
    }

    #[test]
    fn test_failed_send_returns_nonce() {
        let signer = AnchorSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();

        let first = signer.next_nonce(5);
        signer.release_nonce(first);
        // node still reports 5 pending: the retry must reuse 5
        assert_eq!(signer.next_nonce(5), 5);
        assert_eq!(signer.current_nonce(), 6);
    }

    #[test]
    fn test_release_behind_later_nonce_keeps_counter() {
        let signer = AnchorSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();

        let a = signer.next_nonce(0);
        let b = signer.next_nonce(0);
        signer.release_nonce(a);
        assert_eq!(signer.current_nonce(), b + 1);
    }

    #[test]
    fn test_invalid_private_key() {
        let result = AnchorSigner::from_private_key("invalid_key");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));
    }

    #[tokio::test]
    async fn test_sign_transaction() {
        let signer = AnchorSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let tx = TransactionRequest::default()
            .with_to(signer.address())
            .with_value(U256::ZERO)
            .with_input(Bytes::from_static(b"remark"))
            .with_nonce(0)
            .with_gas_price(1_000_000_000)
            .with_gas_limit(30_000)
            .with_chain_id(420_420_421);

        let envelope = signer.sign_transaction(tx).await.unwrap();
        assert!(envelope.is_legacy());
    }
}
