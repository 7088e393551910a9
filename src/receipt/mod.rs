//! Receipts: the downloadable document, its verification QR and the
//! in-memory index served by `/api/receipt`.

pub mod builder;
pub mod qr;
pub mod store;

pub use builder::{Receipt, ReceiptError, PENDING_BLOCK, RECEIPT_TYPE};
pub use qr::{qr_svg, verification_url};
pub use store::{ReceiptStore, StoredReceipt};
