//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for W3b Stitch.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Node connection and submission settings.
    pub chain: ChainConfig,

    /// Anchoring (server-held signer, forwarding backend, public URLs).
    pub anchor: AnchorConfig,

    /// Content hashing limits.
    pub hashing: HashingConfig,

    /// Wallet providers and session handling.
    pub wallet: WalletConfig,

    /// Known networks, used to resolve DIDs.
    pub networks: Vec<NetworkConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    ///
    /// `/api/anchor` holds the request open until block inclusion, so this
    /// is well above a block time.
    pub request_secs: u64,

    /// Timeout for outbound HTTP calls (URL hashing, anchor forwarding).
    pub outbound_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 120,
            outbound_secs: 30,
        }
    }
}

/// Node connection and transaction lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Enable the chain client. Without it `/api/anchor` answers 500.
    pub enabled: bool,

    /// Human-readable network name written into receipts.
    pub network: String,

    /// Node RPC endpoint (http(s) or ws(s)). Overridden by `WESTEND_WSS`.
    pub endpoint: String,

    /// Failover RPC endpoints for read-only queries.
    #[serde(default)]
    pub failover_endpoints: Vec<String>,

    /// Chain ID used for replay protection when signing.
    pub chain_id: u64,

    /// Connection handshake timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Per-call RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Blocks on top of the inclusion block before it counts as finalized,
    /// for nodes that report no finalized head.
    pub finality_depth: u64,

    /// Interval between lifecycle polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Emit a "still waiting" hint when nothing is included after this long.
    pub stall_after_secs: u64,

    /// Minimum free balance (base units) the signer needs before submitting.
    pub min_free_balance: u64,

    /// Gas price multiplier (1.0 = node estimate, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,

    /// Explorer prefix; the transaction hash is appended.
    pub explorer_url: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            network: "westend".to_string(),
            endpoint: "https://westend-asset-hub-eth-rpc.polkadot.io".to_string(),
            failover_endpoints: Vec::new(),
            chain_id: 420_420_421,
            connect_timeout_secs: 15,
            rpc_timeout_secs: 10,
            finality_depth: 2,
            poll_interval_ms: 2_000,
            stall_after_secs: 90,
            min_free_balance: 10_000_000_000_000_000,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 500,
            explorer_url: "https://assethub-westend.subscan.io/extrinsic/".to_string(),
        }
    }
}

/// Anchoring configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Upstream anchor backend for `/api/credential`. Set by `ANCHOR_ENDPOINT`.
    pub forward_endpoint: Option<String>,

    /// Key URI for the server-held signer. Set by `ANCHOR_SIGNER_URI`.
    ///
    /// Either a hex private key or a development name such as `//Alice`.
    pub signer_uri: String,

    /// Public base URL used in verification links and QR codes.
    pub public_base_url: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            forward_endpoint: None,
            signer_uri: "//Alice".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Hashing limits.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HashingConfig {
    /// Maximum number of bytes buffered for one digest. `None` is unbounded.
    pub max_input_bytes: Option<u64>,
}

/// Wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Registered providers, in discovery preference order.
    pub providers: Vec<WalletProviderConfig>,

    /// How long a remembered account stays valid for auto-reconnect.
    pub session_ttl_secs: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            providers: vec![WalletProviderConfig {
                name: "local".to_string(),
                key_uris: vec!["//Alice".to_string()],
            }],
            session_ttl_secs: 30 * 60,
        }
    }
}

/// A key-backed wallet provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalletProviderConfig {
    /// Provider name used for lookup (e.g. "local").
    pub name: String,

    /// Key URIs exposed as accounts.
    #[serde(default)]
    pub key_uris: Vec<String>,
}

/// A named network reachable from a DID.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct NetworkConfig {
    /// DID method (e.g. "polkadot").
    pub method: String,

    /// Network name within the method (e.g. "westend").
    pub name: String,

    /// RPC endpoint.
    pub endpoint: String,
}

impl NetworkConfig {
    fn new(method: &str, name: &str, endpoint: &str) -> Self {
        Self {
            method: method.to_string(),
            name: name.to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Networks known out of the box.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("polkadot", "polkadot", "wss://rpc.polkadot.io"),
            Self::new("polkadot", "kusama", "wss://kusama-rpc.polkadot.io"),
            Self::new("polkadot", "westend", "wss://westend-rpc.polkadot.io"),
            Self::new("solana", "devnet", "https://api.devnet.solana.com"),
        ]
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes (file uploads to `/api/verify/file`).
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 25 * 1024 * 1024,
        }
    }
}
