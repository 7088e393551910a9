//! Anchor payload and its hex transport encoding.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hashing::digest::{strip_hex_prefix, ALGORITHM};
use crate::hashing::HashedContent;

/// Version tag written into every payload.
pub const PAYLOAD_VERSION: &str = "w3bstitch.anchor";

/// The record embedded in a remark transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorPayload {
    /// Version tag.
    pub v: String,
    /// Hash algorithm name.
    pub alg: String,
    /// Digest, `0x` + hex.
    pub hash: String,
    /// Source URL or "(local file)".
    pub url: String,
    /// Creation time, RFC 3339 UTC with milliseconds.
    pub ts: String,
}

/// Errors decoding a hex-encoded payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("payload is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("payload is not an anchor record: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnchorPayload {
    /// Build a payload for hashed content, stamped now.
    pub fn for_content(content: &HashedContent) -> Self {
        Self {
            v: PAYLOAD_VERSION.to_string(),
            alg: ALGORITHM.to_string(),
            hash: content.digest.to_string(),
            url: content.source.describe().to_string(),
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// UTF-8 JSON bytes, as carried in the transaction.
    pub fn to_bytes(&self) -> Vec<u8> {
        // a struct of plain strings always serializes
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// `0x`-prefixed hex of the JSON bytes.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PayloadError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, PayloadError> {
        let json = decode_utf8_hex(hex_str)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Encode a string as `0x` + lowercase hex of its UTF-8 bytes.
pub fn encode_utf8_hex(s: &str) -> String {
    format!("0x{}", hex::encode(s.as_bytes()))
}

/// Inverse of [`encode_utf8_hex`]; the `0x` prefix is optional.
pub fn decode_utf8_hex(s: &str) -> Result<String, PayloadError> {
    let bytes = hex::decode(strip_hex_prefix(s))?;
    Ok(String::from_utf8(bytes)?)
}
