//! Transaction data receipts.

use std::path::{Path, PathBuf};

use alloy::primitives::{Address, TxHash};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anchor::AnchorPayload;
use crate::blockchain::BlockRef;

/// Type tag of every receipt.
pub const RECEIPT_TYPE: &str = "w3bstitch.tdr";

/// Written in place of a block hash before finality.
pub const PENDING_BLOCK: &str = "(pending)";

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("receipt serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("receipt write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid base URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("base URL cannot carry a path: {0}")]
    InvalidBase(String),

    #[error("QR encoding failed: {0}")]
    Qr(String),
}

/// Proof-of-submission document. Carries no signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(rename = "type")]
    pub kind: String,
    pub chain: String,
    pub extrinsic_hash: String,
    /// Block hash, or [`PENDING_BLOCK`].
    pub finalized_block: String,
    pub account: String,
    pub payload: AnchorPayload,
}

impl Receipt {
    pub fn new(
        chain: &str,
        tx_hash: TxHash,
        finalized: Option<BlockRef>,
        account: Address,
        payload: AnchorPayload,
    ) -> Self {
        Self {
            kind: RECEIPT_TYPE.to_string(),
            chain: chain.to_string(),
            extrinsic_hash: tx_hash.to_string(),
            finalized_block: finalized
                .map(|b| b.hash.to_string())
                .unwrap_or_else(|| PENDING_BLOCK.to_string()),
            account: account.to_string(),
            payload,
        }
    }

    pub fn is_final(&self) -> bool {
        self.finalized_block != PENDING_BLOCK
    }

    pub fn to_pretty_json(&self) -> Result<String, ReceiptError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `tdr-<unix-millis>.json`
    pub fn file_name_at(unix_millis: i64) -> String {
        format!("tdr-{}.json", unix_millis)
    }

    /// Write the pretty JSON into `dir` under a fresh timestamped name.
    pub async fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ReceiptError> {
        let path = dir.join(Self::file_name_at(Utc::now().timestamp_millis()));
        tokio::fs::write(&path, self.to_pretty_json()?).await?;
        tracing::info!(path = %path.display(), tx_hash = %self.extrinsic_hash, "Receipt written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::scripted::block_ref;
    use crate::hashing::{ContentHasher, SourceDescriptor};

    fn payload() -> AnchorPayload {
        let content = ContentHasher::default()
            .hash_bytes(b"receipt test", SourceDescriptor::Url("https://example.com/a.jpg".into()))
            .unwrap();
        AnchorPayload::for_content(&content)
    }

    #[test]
    fn test_pending_receipt_shape() {
        let receipt = Receipt::new("westend", TxHash::repeat_byte(1), None, Address::ZERO, payload());
        let json: serde_json::Value = serde_json::from_str(&receipt.to_pretty_json().unwrap()).unwrap();

        assert_eq!(json["type"], "w3bstitch.tdr");
        assert_eq!(json["chain"], "westend");
        assert_eq!(json["finalizedBlock"], "(pending)");
        assert_eq!(json["payload"]["v"], "w3bstitch.anchor");
        assert_eq!(json["payload"]["url"], "https://example.com/a.jpg");
        assert!(json["extrinsicHash"].as_str().unwrap().starts_with("0x"));
        assert!(!receipt.is_final());
    }

    #[test]
    fn test_finalized_receipt() {
        let block = block_ref(42);
        let receipt = Receipt::new("westend", TxHash::ZERO, Some(block), Address::ZERO, payload());
        assert_eq!(receipt.finalized_block, block.hash.to_string());
        assert!(receipt.is_final());
        // pretty printed
        assert!(receipt.to_pretty_json().unwrap().contains("\n  \"chain\""));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(Receipt::file_name_at(1_700_000_000_123), "tdr-1700000000123.json");
    }

    #[tokio::test]
    async fn test_write_to_dir() {
        let dir = std::env::temp_dir().join(format!("stitch-receipt-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let receipt = Receipt::new("westend", TxHash::ZERO, None, Address::ZERO, payload());
        let path = receipt.write_to_dir(&dir).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("tdr-") && name.ends_with(".json"));

        let back: Receipt = serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(back, receipt);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
