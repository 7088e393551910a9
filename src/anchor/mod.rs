//! Anchoring: the on-chain payload and the flow that submits it.
//!
//! # Data Flow
//! ```text
//! AnchorSource (file / URL)
//!     → hashing (Digest)
//!     → payload.rs (AnchorPayload → UTF-8 JSON bytes)
//!     → wallet (signer) → blockchain (SubmissionHandle)
//!     → status (StatusReducer) → receipt (Receipt + verification URL)
//! ```

pub mod payload;
pub mod workflow;

pub use payload::{decode_utf8_hex, encode_utf8_hex, AnchorPayload, PayloadError, PAYLOAD_VERSION};
pub use workflow::{
    explorer_link, AnchorError, AnchorOutcome, AnchorRequest, AnchorSource, AnchorWorkflow,
};
