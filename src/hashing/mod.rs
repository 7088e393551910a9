//! Content hashing subsystem.
//!
//! # Data Flow
//! ```text
//! local file ─┐
//!             ├→ source.rs (buffer whole payload, optional byte cap)
//! remote URL ─┘      → digest.rs (SHA-256) → HashedContent { digest, byte_len, source }
//! ```

pub mod digest;
pub mod source;

pub use digest::{Digest, DigestParseError};
pub use source::{ContentHasher, HashError, HashedContent, SourceDescriptor};
