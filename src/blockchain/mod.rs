//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! ANCHOR_SIGNER_URI / wallet provider
//!     → signer.rs (key loading, signing, nonce tracking)
//!     → client.rs (preflight: node synced, balance sufficient)
//!     → transport.rs (build remark transaction, broadcast, failover reads)
//!     → submission.rs (tracker task → SubmissionHandle stream)
//! ```
//!
//! # Security Constraints
//! - Keys only from configuration or environment
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when the node is unreachable

pub mod client;
pub mod scripted;
pub mod signer;
pub mod submission;
pub mod transport;
pub mod types;

pub use client::ChainClient;
pub use signer::{AnchorSigner, TransactionSigner};
pub use submission::{SubmissionHandle, SubmissionSettings, SubmissionState, SubmissionUpdate};
pub use transport::{AlloyTransport, ChainTransport};
pub use types::{
    BlockRef, ChainError, ChainResult, DispatchFailure, Inclusion, LifecycleStatus, NodeInfo,
    RemarkEvent,
};
