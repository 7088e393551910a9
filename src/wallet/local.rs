//! Wallet backed by locally configured keys.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::blockchain::{AnchorSigner, TransactionSigner};
use crate::config::WalletProviderConfig;
use crate::wallet::provider::{WalletError, WalletProvider};

/// Holds a fixed set of keys; access is granted on `connect` unless the
/// wallet was built to refuse.
#[derive(Debug)]
pub struct LocalKeyWallet {
    name: String,
    signers: Vec<Arc<AnchorSigner>>,
    connected: AtomicBool,
    refuse: bool,
}

impl LocalKeyWallet {
    pub fn new(name: impl Into<String>, signers: Vec<AnchorSigner>) -> Self {
        Self {
            name: name.into(),
            signers: signers.into_iter().map(Arc::new).collect(),
            connected: AtomicBool::new(false),
            refuse: false,
        }
    }

    /// Load every key URI of a configured provider.
    pub fn from_config(config: &WalletProviderConfig) -> Result<Self, WalletError> {
        let signers = config
            .key_uris
            .iter()
            .map(|uri| AnchorSigner::from_uri(uri))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(config.name.clone(), signers))
    }

    /// A wallet that rejects every access request.
    pub fn refusing(name: impl Into<String>) -> Self {
        Self {
            refuse: true,
            ..Self::new(name, Vec::new())
        }
    }

    pub fn accounts(&self) -> Vec<Address> {
        self.signers.iter().map(|s| s.address()).collect()
    }
}

#[async_trait]
impl WalletProvider for LocalKeyWallet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self, app_name: &str) -> Result<Vec<Address>, WalletError> {
        if self.refuse {
            return Err(WalletError::PermissionDenied(self.name.clone()));
        }
        if self.signers.is_empty() {
            return Err(WalletError::NoAccountsFound(self.name.clone()));
        }
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!(wallet = %self.name, app = app_name, accounts = self.signers.len(), "Wallet access granted");
        Ok(self.accounts())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn public_key(&self) -> Option<Address> {
        if !self.connected.load(Ordering::SeqCst) {
            return None;
        }
        self.signers.first().map(|s| s.address())
    }

    fn signer(&self, account: Address) -> Result<Arc<dyn TransactionSigner>, WalletError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(WalletError::NotConnected(self.name.clone()));
        }
        let signer = self
            .signers
            .iter()
            .find(|s| s.address() == account)
            .ok_or(WalletError::UnknownAccount(account))?;
        let signer: Arc<dyn TransactionSigner> = signer.clone();
        Ok(signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(uris: &[&str]) -> WalletProviderConfig {
        WalletProviderConfig {
            name: "local".to_string(),
            key_uris: uris.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_connect_lists_accounts() {
        let wallet = LocalKeyWallet::from_config(&config(&["//Alice", "//Bob"])).unwrap();
        assert!(wallet.public_key().is_none());

        let accounts = wallet.connect("W3b Stitch").await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(wallet.public_key(), Some(accounts[0]));

        let signer = wallet.signer(accounts[1]).unwrap();
        assert_eq!(signer.address(), accounts[1]);

        wallet.disconnect().await.unwrap();
        assert!(wallet.public_key().is_none());
        assert!(matches!(wallet.signer(accounts[1]), Err(WalletError::NotConnected(_))));
    }

    #[tokio::test]
    async fn test_empty_wallet() {
        let wallet = LocalKeyWallet::from_config(&config(&[])).unwrap();
        let err = wallet.connect("W3b Stitch").await.unwrap_err();
        assert!(matches!(err, WalletError::NoAccountsFound(_)));
    }

    #[tokio::test]
    async fn test_refusing_wallet() {
        let wallet = LocalKeyWallet::refusing("locked");
        let err = wallet.connect("W3b Stitch").await.unwrap_err();
        assert!(matches!(err, WalletError::PermissionDenied(ref n) if n == "locked"));
    }

    #[test]
    fn test_bad_key_uri() {
        let err = LocalKeyWallet::from_config(&config(&["//Nobody"])).unwrap_err();
        assert!(matches!(err, WalletError::Key(_)));
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let wallet = LocalKeyWallet::from_config(&config(&["//Alice"])).unwrap();
        wallet.connect("W3b Stitch").await.unwrap();
        let err = wallet.signer(Address::ZERO).err().unwrap();
        assert!(matches!(err, WalletError::UnknownAccount(_)));
    }
}
