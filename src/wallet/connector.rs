//! Connect, auto-reconnect and logout on top of the registry.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;

use crate::blockchain::TransactionSigner;
use crate::config::WalletConfig;
use crate::wallet::provider::{short_address, WalletError};
use crate::wallet::registry::WalletRegistry;
use crate::wallet::session::{SessionStore, WalletSession};

/// Name presented to wallets when asking for access.
pub const APP_NAME: &str = "W3b Stitch";

/// An account ready to sign.
#[derive(Clone)]
pub struct WalletConnection {
    pub provider: String,
    pub account: Address,
    pub signer: Arc<dyn TransactionSigner>,
}

impl WalletConnection {
    pub fn status_line(&self) -> String {
        format!("Wallet connected: {}", short_address(&self.account))
    }
}

impl std::fmt::Debug for WalletConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConnection")
            .field("provider", &self.provider)
            .field("account", &self.account)
            .finish()
    }
}

#[derive(Debug)]
pub struct WalletConnector {
    registry: WalletRegistry,
    sessions: SessionStore,
}

impl WalletConnector {
    pub fn new(registry: WalletRegistry, session_ttl: Duration) -> Self {
        Self {
            registry,
            sessions: SessionStore::new(session_ttl),
        }
    }

    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        Ok(Self::new(
            WalletRegistry::from_config(config)?,
            Duration::from_secs(config.session_ttl_secs),
        ))
    }

    pub fn registry(&self) -> &WalletRegistry {
        &self.registry
    }

    /// Ask `provider` (or the preferred one) for access and take its first
    /// account. The choice is remembered under `session_id`.
    pub async fn connect(
        &self,
        session_id: &str,
        provider: Option<&str>,
    ) -> Result<WalletConnection, WalletError> {
        let wallet = self.registry.resolve(provider)?;
        let accounts = wallet.connect(APP_NAME).await?;
        let account = *accounts
            .first()
            .ok_or_else(|| WalletError::NoAccountsFound(wallet.name().to_string()))?;

        let connection = WalletConnection {
            provider: wallet.name().to_string(),
            account,
            signer: wallet.signer(account)?,
        };
        self.sessions.remember(
            session_id,
            WalletSession {
                provider: connection.provider.clone(),
                account,
            },
        );
        tracing::info!(wallet = %connection.provider, account = %account, "Wallet connected");
        Ok(connection)
    }

    /// Restore a remembered session without asking again.
    ///
    /// Falls back to the wallet's first account when the remembered one is
    /// gone. Any failure clears the session and yields `None`.
    pub async fn reconnect(&self, session_id: &str) -> Option<WalletConnection> {
        let saved = self.sessions.get(session_id)?;

        let result = async {
            let wallet = self.registry.resolve(Some(saved.provider.as_str()))?;
            let accounts = wallet.connect(APP_NAME).await?;
            let account = accounts
                .iter()
                .copied()
                .find(|a| *a == saved.account)
                .or_else(|| accounts.first().copied())
                .ok_or_else(|| WalletError::NoAccountsFound(saved.provider.clone()))?;
            Ok::<_, WalletError>(WalletConnection {
                provider: saved.provider.clone(),
                account,
                signer: wallet.signer(account)?,
            })
        }
        .await;

        match result {
            Ok(connection) => {
                self.sessions.remember(
                    session_id,
                    WalletSession {
                        provider: connection.provider.clone(),
                        account: connection.account,
                    },
                );
                Some(connection)
            }
            Err(e) => {
                tracing::debug!(session = session_id, error = %e, "Auto-reconnect failed, clearing session");
                self.sessions.forget(session_id);
                None
            }
        }
    }

    /// Revoke access and forget the session.
    pub async fn logout(&self, session_id: &str) {
        let Some(saved) = self.sessions.forget(session_id) else {
            return;
        };
        if let Some(wallet) = self.registry.get(&saved.provider) {
            if let Err(e) = wallet.disconnect().await {
                tracing::debug!(wallet = %saved.provider, error = %e, "Wallet disconnect failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalletProviderConfig;
    use crate::wallet::local::LocalKeyWallet;

    fn connector() -> WalletConnector {
        let config = WalletConfig {
            providers: vec![WalletProviderConfig {
                name: "local".into(),
                key_uris: vec!["//Alice".into(), "//Bob".into()],
            }],
            session_ttl_secs: 60,
        };
        WalletConnector::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_connect_then_reconnect() {
        let connector = connector();
        assert!(connector.reconnect("s1").await.is_none());

        let first = connector.connect("s1", None).await.unwrap();
        assert_eq!(first.provider, "local");
        assert!(first.status_line().starts_with("Wallet connected: 0x"));

        let again = connector.reconnect("s1").await.unwrap();
        assert_eq!(again.account, first.account);
        assert_eq!(again.signer.address(), first.account);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let connector = connector();
        connector.connect("s1", Some("local")).await.unwrap();
        connector.logout("s1").await;
        assert!(connector.reconnect("s1").await.is_none());
        assert!(connector.registry().get("local").unwrap().public_key().is_none());
    }

    #[tokio::test]
    async fn test_permission_denied_surfaces() {
        let mut registry = WalletRegistry::new();
        registry.register(Arc::new(LocalKeyWallet::refusing("locked")));
        let connector = WalletConnector::new(registry, Duration::from_secs(60));

        let err = connector.connect("s1", None).await.unwrap_err();
        assert!(matches!(err, WalletError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_no_wallet() {
        let connector = WalletConnector::new(WalletRegistry::new(), Duration::from_secs(60));
        let err = connector.connect("s1", None).await.unwrap_err();
        assert!(matches!(err, WalletError::NoWalletFound(None)));
    }
}
