//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, derived defaults)
//!     → loader.rs (environment overrides: ANCHOR_ENDPOINT, WESTEND_WSS, ...)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via AppState to handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow running without a file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::AnchorConfig;
pub use schema::ChainConfig;
pub use schema::HashingConfig;
pub use schema::NetworkConfig;
pub use schema::ObservabilityConfig;
pub use schema::WalletConfig;
pub use schema::WalletProviderConfig;
