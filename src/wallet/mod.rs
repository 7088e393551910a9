//! Wallet discovery and account access.
//!
//! # Data Flow
//! ```text
//! [wallet] config
//!     → registry.rs (named providers, preference order)
//!     → connector.rs (connect / reconnect / logout)
//!         → session.rs (remembered account, expires)
//!     → TransactionSigner for the chosen account
//! ```

pub mod connector;
pub mod local;
pub mod provider;
pub mod registry;
pub mod session;

pub use connector::{WalletConnection, WalletConnector, APP_NAME};
pub use local::LocalKeyWallet;
pub use provider::{short_address, WalletError, WalletProvider};
pub use registry::WalletRegistry;
pub use session::{SessionStore, WalletSession};
