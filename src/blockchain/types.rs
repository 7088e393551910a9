//! Chain-specific types and error definitions.

use std::fmt;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport session could not be established.
    #[error("Connection error: {0}")]
    Connection(String),

    /// RPC request failed on every provider.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node is still catching up with the network.
    #[error("RPC is syncing; try again in a minute or switch RPC")]
    NodeSyncing,

    /// The signer cannot pay fees; nothing was broadcast.
    #[error("Not enough funds to pay fees. Free balance: {free}, required: {required}")]
    InsufficientFunds { free: U256, required: U256 },

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Invalid key material or signing failure.
    #[error("Signer error: {0}")]
    Signer(String),

    /// The node refused the signed transaction.
    #[error("Transaction rejected by node: {0}")]
    Rejected(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Chain client not initialized or disabled.
    #[error("Chain not available: {0}")]
    NotAvailable(String),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// A block as reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRef {
    pub hash: B256,
    pub number: u64,
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// A dispatch-level failure: the transaction was included but rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DispatchFailure {
    /// Decoded error with a module/section, name and description.
    Module {
        section: String,
        name: String,
        description: String,
    },
    /// Anything that could not be decoded further.
    Other { message: String },
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchFailure::Module { section, name, description } => {
                write!(f, "{}.{}: {}", section, name, description)
            }
            DispatchFailure::Other { message } => f.write_str(message),
        }
    }
}

/// Lifecycle events reported for one submitted transaction, in node order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "camelCase")]
pub enum LifecycleStatus {
    Broadcast,
    InBlock(BlockRef),
    Finalized(BlockRef),
    DispatchError(DispatchFailure),
}

impl LifecycleStatus {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleStatus::Broadcast => "broadcast",
            LifecycleStatus::InBlock(_) => "in_block",
            LifecycleStatus::Finalized(_) => "finalized",
            LifecycleStatus::DispatchError(_) => "dispatch_error",
        }
    }
}

/// Where a transaction landed, and whether it executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inclusion {
    pub block: BlockRef,
    /// Position of the transaction within the block.
    pub index: u64,
    pub failure: Option<DispatchFailure>,
}

/// Sync state of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeHealth {
    pub syncing: bool,
}

/// Identity of the connected node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub chain_id: u64,
    pub client_version: String,
    pub best_block: u64,
    pub syncing: bool,
}

/// A remark read back from a block: who sent it and the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemarkEvent {
    pub sender: Address,
    pub data: Bytes,
}
