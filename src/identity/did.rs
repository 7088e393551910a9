//! `did:<method>:<network>` identifiers and the networks they point at.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::config::NetworkConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DidError {
    #[error("Unsupported DID format")]
    Format,

    #[error("Unsupported network: {0}")]
    UnknownNetwork(String),
}

/// A parsed network DID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Did {
    pub method: String,
    pub network: String,
}

impl FromStr for Did {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("did"), Some(method), Some(network), None)
                if is_segment(method) && is_segment(network) =>
            {
                Ok(Did {
                    method: method.to_string(),
                    network: network.to_string(),
                })
            }
            _ => Err(DidError::Format),
        }
    }
}

fn is_segment(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}", self.method, self.network)
    }
}

/// Known networks, looked up by DID.
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    networks: Vec<NetworkConfig>,
}

impl NetworkRegistry {
    pub fn new(networks: Vec<NetworkConfig>) -> Self {
        Self { networks }
    }

    pub fn resolve(&self, did: &Did) -> Result<&NetworkConfig, DidError> {
        self.networks
            .iter()
            .find(|n| n.method == did.method && n.name == did.network)
            .ok_or_else(|| DidError::UnknownNetwork(did.network.clone()))
    }

    /// Parse and resolve in one step.
    pub fn resolve_str(&self, did: &str) -> Result<&NetworkConfig, DidError> {
        self.resolve(&did.parse()?)
    }

    pub fn networks(&self) -> &[NetworkConfig] {
        &self.networks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let did: Did = "did:polkadot:westend".parse().unwrap();
        assert_eq!(did.method, "polkadot");
        assert_eq!(did.network, "westend");
        assert_eq!(did.to_string(), "did:polkadot:westend");
    }

    #[test]
    fn test_parse_rejects_bad_formats() {
        for bad in ["", "did", "did:polkadot", "did:polkadot:", "did:polkadot:a:b", "foo:polkadot:westend", "did::westend"] {
            assert_eq!(bad.parse::<Did>(), Err(DidError::Format), "{:?}", bad);
        }
    }

    #[test]
    fn test_resolve() {
        let registry = NetworkRegistry::new(NetworkConfig::defaults());
        let westend = registry.resolve_str("did:polkadot:westend").unwrap();
        assert_eq!(westend.endpoint, "wss://westend-rpc.polkadot.io");

        let devnet = registry.resolve_str("did:solana:devnet").unwrap();
        assert!(devnet.endpoint.contains("devnet"));

        assert_eq!(
            registry.resolve_str("did:polkadot:rococo"),
            Err(DidError::UnknownNetwork("rococo".to_string()))
        );
        // the method must match too
        assert!(registry.resolve_str("did:solana:westend").is_err());
    }
}
