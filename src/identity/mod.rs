//! Decentralized identifiers.

pub mod did;

pub use did::{Did, DidError, NetworkRegistry};
