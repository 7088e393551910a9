//! Configuration loading from disk and the process environment.

use std::path::Path;
use std::fs;
use crate::config::schema::{AppConfig, NetworkConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Upstream anchor backend for `/api/credential`.
pub const ANCHOR_ENDPOINT_ENV: &str = "ANCHOR_ENDPOINT";
/// Node endpoint used by the chain client.
pub const NODE_ENDPOINT_ENV: &str = "WESTEND_WSS";
/// Key URI of the server-held signer.
pub const SIGNER_URI_ENV: &str = "ANCHOR_SIGNER_URI";
/// Public Solana RPC endpoint.
pub const SOLANA_RPC_ENV: &str = "NEXT_PUBLIC_SOLANA_RPC";
/// Public Polkadot relay endpoint.
pub const DOT_WSS_ENV: &str = "NEXT_PUBLIC_DOT_WSS";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a TOML file (or defaults when `path` is `None`), apply environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => AppConfig::default(),
    };

    finalize(config, |key| std::env::var(key).ok())
}

/// Fill derived defaults, apply overrides from `env`, validate.
///
/// `env` is injected so tests do not touch the process environment.
pub fn finalize<F>(mut config: AppConfig, env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if config.networks.is_empty() {
        config.networks = NetworkConfig::defaults();
    }

    apply_env_overrides(&mut config, env);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn apply_env_overrides<F>(config: &mut AppConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(endpoint) = non_empty(ANCHOR_ENDPOINT_ENV) {
        config.anchor.forward_endpoint = Some(endpoint);
    }
    if let Some(endpoint) = non_empty(NODE_ENDPOINT_ENV) {
        config.chain.endpoint = endpoint;
    }
    if let Some(uri) = non_empty(SIGNER_URI_ENV) {
        config.anchor.signer_uri = uri;
    }
    if let Some(endpoint) = non_empty(DOT_WSS_ENV) {
        set_network_endpoint(&mut config.networks, "polkadot", "polkadot", endpoint);
    }
    if let Some(endpoint) = non_empty(SOLANA_RPC_ENV) {
        set_network_endpoint(&mut config.networks, "solana", "devnet", endpoint);
    }
}

fn set_network_endpoint(networks: &mut Vec<NetworkConfig>, method: &str, name: &str, endpoint: String) {
    match networks.iter_mut().find(|n| n.method == method && n.name == name) {
        Some(network) => network.endpoint = endpoint,
        None => networks.push(NetworkConfig {
            method: method.to_string(),
            name: name.to_string(),
            endpoint,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let config = finalize(
            AppConfig::default(),
            env_from(&[
                (ANCHOR_ENDPOINT_ENV, "http://anchor.internal/api/anchor"),
                (NODE_ENDPOINT_ENV, "ws://127.0.0.1:8546"),
                (SIGNER_URI_ENV, "//Bob"),
                (SOLANA_RPC_ENV, "http://127.0.0.1:8899"),
            ]),
        )
        .unwrap();

        assert_eq!(
            config.anchor.forward_endpoint.as_deref(),
            Some("http://anchor.internal/api/anchor")
        );
        assert_eq!(config.chain.endpoint, "ws://127.0.0.1:8546");
        assert_eq!(config.anchor.signer_uri, "//Bob");
        let solana = config
            .networks
            .iter()
            .find(|n| n.method == "solana")
            .unwrap();
        assert_eq!(solana.endpoint, "http://127.0.0.1:8899");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let config = finalize(AppConfig::default(), env_from(&[(ANCHOR_ENDPOINT_ENV, "  ")])).unwrap();
        assert!(config.anchor.forward_endpoint.is_none());
    }

    #[test]
    fn test_dot_override_adds_missing_network() {
        let mut base = AppConfig::default();
        base.networks = vec![NetworkConfig {
            method: "polkadot".into(),
            name: "westend".into(),
            endpoint: "wss://westend-rpc.polkadot.io".into(),
        }];
        let config = finalize(base, env_from(&[(DOT_WSS_ENV, "wss://dot.example")])).unwrap();
        assert_eq!(config.networks.len(), 2);
        assert_eq!(config.networks[1].endpoint, "wss://dot.example");
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let err = finalize(AppConfig::default(), env_from(&[(ANCHOR_ENDPOINT_ENV, "not a url")]))
            .unwrap_err();
        assert!(err.to_string().contains("anchor.forward_endpoint"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
