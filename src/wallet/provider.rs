//! Wallet provider abstraction.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use thiserror::Error;

use crate::blockchain::{ChainError, TransactionSigner};

/// Errors from wallet discovery and account access.
#[derive(Debug, Error)]
pub enum WalletError {
    /// No provider registered, or none under the requested name.
    #[error("No wallet found{}", .0.as_ref().map(|n| format!(": {}", n)).unwrap_or_default())]
    NoWalletFound(Option<String>),

    /// The wallet exposes zero accounts to this application.
    #[error("No accounts found in wallet '{0}'")]
    NoAccountsFound(String),

    /// The user (or wallet policy) refused access.
    #[error("Permission denied by wallet '{0}'")]
    PermissionDenied(String),

    /// Requested account is not held by the wallet.
    #[error("Account {0} is not available in this wallet")]
    UnknownAccount(Address),

    #[error("Wallet '{0}' is not connected")]
    NotConnected(String),

    /// A configured key could not be loaded.
    #[error("Wallet key error: {0}")]
    Key(#[from] ChainError),
}

/// A source of accounts and signatures.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Registry name, e.g. `local`.
    fn name(&self) -> &str;

    /// Ask for access and list the accounts granted to `app_name`.
    ///
    /// May wait on user approval without a timeout.
    async fn connect(&self, app_name: &str) -> Result<Vec<Address>, WalletError>;

    /// Revoke this application's access.
    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Primary account while connected.
    fn public_key(&self) -> Option<Address>;

    /// Signer for one of the granted accounts.
    fn signer(&self, account: Address) -> Result<Arc<dyn TransactionSigner>, WalletError>;
}

/// `0x1234…abcdef` form for status lines.
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    if full.len() <= 12 {
        return full;
    }
    format!("{}…{}", &full[..6], &full[full.len() - 6..])
}
