//! W3b Stitch: hash media, anchor the digest on chain, verify by QR.

pub mod anchor;
pub mod blockchain;
pub mod config;
pub mod hashing;
pub mod http;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod receipt;
pub mod status;
pub mod verify;
pub mod wallet;

pub use config::AppConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
