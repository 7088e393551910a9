//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → HTTP server stops accepting → in-flight requests drain
//!             → submission trackers observe dropped handles and exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
