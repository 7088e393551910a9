//! In-memory receipt index keyed by transaction hash.

use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::observability::metrics;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReceipt {
    pub tx_hash: String,
    pub did: String,
    pub hash: String,
    pub filename: String,
    /// When the receipt was stored, RFC 3339 UTC.
    pub timestamp: String,
}

/// Last write wins; nothing survives a restart.
#[derive(Debug, Default)]
pub struct ReceiptStore {
    receipts: DashMap<String, StoredReceipt>,
}

impl ReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, tx_hash: &str, did: &str, hash: &str, filename: &str) -> StoredReceipt {
        let receipt = StoredReceipt {
            tx_hash: tx_hash.to_string(),
            did: did.to_string(),
            hash: hash.to_string(),
            filename: filename.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        self.receipts.insert(receipt.tx_hash.clone(), receipt.clone());
        metrics::record_receipt_store_size(self.receipts.len());
        receipt
    }

    pub fn get(&self, tx_hash: &str) -> Option<StoredReceipt> {
        self.receipts.get(tx_hash).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get() {
        let store = ReceiptStore::new();
        assert!(store.get("0x01").is_none());

        let stored = store.put("0x01", "did:polkadot:westend", "0xabc", "a.jpg");
        assert_eq!(store.get("0x01"), Some(stored.clone()));
        assert!(stored.timestamp.ends_with('Z'));
    }

    #[test]
    fn test_last_write_wins() {
        let store = ReceiptStore::new();
        store.put("0x01", "did:a", "0xabc", "a.jpg");
        store.put("0x01", "did:b", "0xdef", "b.jpg");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("0x01").unwrap().filename, "b.jpg");
    }

    #[test]
    fn test_camel_case_fields() {
        let store = ReceiptStore::new();
        let stored = store.put("0x01", "did:a", "0xabc", "a.jpg");
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["txHash"], "0x01");
        assert!(json.get("timestamp").is_some());
    }
}
