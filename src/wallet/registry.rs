//! Named wallet providers, resolved once at startup.

use std::sync::Arc;

use crate::config::WalletConfig;
use crate::wallet::local::LocalKeyWallet;
use crate::wallet::provider::{WalletError, WalletProvider};

/// Providers in preference order.
#[derive(Clone, Default)]
pub struct WalletRegistry {
    providers: Vec<Arc<dyn WalletProvider>>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One local-key provider per configured entry, in configured order.
    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        let mut registry = Self::new();
        for provider in &config.providers {
            registry.register(Arc::new(LocalKeyWallet::from_config(provider)?));
        }
        Ok(registry)
    }

    /// Add a provider at the lowest preference. A provider with the same
    /// name is replaced in place.
    pub fn register(&mut self, provider: Arc<dyn WalletProvider>) {
        match self.providers.iter().position(|p| p.name() == provider.name()) {
            Some(i) => self.providers[i] = provider,
            None => self.providers.push(provider),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn WalletProvider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    /// The named provider, or the most preferred one when `name` is `None`.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn WalletProvider>, WalletError> {
        match name {
            Some(name) => self
                .get(name)
                .ok_or_else(|| WalletError::NoWalletFound(Some(name.to_string()))),
            None => self
                .providers
                .first()
                .cloned()
                .ok_or(WalletError::NoWalletFound(None)),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for WalletRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalletProviderConfig;

    fn wallet_config() -> WalletConfig {
        WalletConfig {
            providers: vec![
                WalletProviderConfig {
                    name: "subwallet".into(),
                    key_uris: vec!["//Bob".into()],
                },
                WalletProviderConfig {
                    name: "local".into(),
                    key_uris: vec!["//Alice".into()],
                },
            ],
            ..WalletConfig::default()
        }
    }

    #[test]
    fn test_preference_order() {
        let registry = WalletRegistry::from_config(&wallet_config()).unwrap();
        assert_eq!(registry.names(), vec!["subwallet", "local"]);
        assert_eq!(registry.resolve(None).unwrap().name(), "subwallet");
        assert_eq!(registry.resolve(Some("local")).unwrap().name(), "local");
    }

    #[test]
    fn test_missing_provider() {
        let registry = WalletRegistry::from_config(&wallet_config()).unwrap();
        let err = registry.resolve(Some("polkadot-js")).err().unwrap();
        assert!(matches!(err, WalletError::NoWalletFound(Some(_))));

        let empty = WalletRegistry::new();
        assert!(matches!(empty.resolve(None).err().unwrap(), WalletError::NoWalletFound(None)));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = WalletRegistry::from_config(&wallet_config()).unwrap();
        registry.register(Arc::new(LocalKeyWallet::refusing("local")));
        assert_eq!(registry.names(), vec!["subwallet", "local"]);
    }
}
