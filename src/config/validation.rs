//! Configuration validation.
//!
//! Semantic checks on top of what serde already enforces. All errors are
//! collected, not just the first one.

use std::fmt;

use crate::config::schema::AppConfig;

/// One semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }
    if config.timeouts.outbound_secs == 0 {
        errors.push(ValidationError::new("timeouts.outbound_secs", "must be > 0"));
    }

    let chain = &config.chain;
    if chain.enabled {
        if url::Url::parse(&chain.endpoint).is_err() {
            errors.push(ValidationError::new(
                "chain.endpoint",
                format!("'{}' is not a URL", chain.endpoint),
            ));
        }
        if chain.poll_interval_ms == 0 {
            errors.push(ValidationError::new("chain.poll_interval_ms", "must be > 0"));
        }
        if chain.rpc_timeout_secs == 0 {
            errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be > 0"));
        }
        if chain.gas_price_multiplier < 1.0 {
            errors.push(ValidationError::new(
                "chain.gas_price_multiplier",
                "must be >= 1.0",
            ));
        }
    }

    if let Some(endpoint) = &config.anchor.forward_endpoint {
        if url::Url::parse(endpoint).is_err() {
            errors.push(ValidationError::new(
                "anchor.forward_endpoint",
                format!("'{}' is not a URL", endpoint),
            ));
        }
    }
    if url::Url::parse(&config.anchor.public_base_url).is_err() {
        errors.push(ValidationError::new(
            "anchor.public_base_url",
            format!("'{}' is not a URL", config.anchor.public_base_url),
        ));
    }

    let mut names = std::collections::HashSet::new();
    for provider in &config.wallet.providers {
        if !names.insert(provider.name.as_str()) {
            errors.push(ValidationError::new(
                "wallet.providers",
                format!("duplicate provider name '{}'", provider.name),
            ));
        }
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}', expected pretty or json", other),
        )),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::WalletProviderConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.chain.poll_interval_ms = 0;
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "chain.poll_interval_ms"));
    }

    #[test]
    fn test_disabled_chain_skips_chain_checks() {
        let mut config = AppConfig::default();
        config.chain.enabled = false;
        config.chain.endpoint = "not a url".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_duplicate_wallet_provider() {
        let mut config = AppConfig::default();
        config.wallet.providers.push(WalletProviderConfig {
            name: "local".into(),
            key_uris: vec![],
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("duplicate provider name"));
    }
}
