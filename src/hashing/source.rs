//! Byte sources: local files and remote URLs.
//!
//! The whole payload is buffered before hashing. When a byte cap is
//! configured, reads stop as soon as it is crossed.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncReadExt;

use crate::hashing::digest::Digest;

/// Where hashed bytes came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceDescriptor {
    Url(String),
    LocalFile,
}

impl SourceDescriptor {
    /// The form written into anchor payloads.
    pub fn describe(&self) -> &str {
        match self {
            SourceDescriptor::Url(url) => url,
            SourceDescriptor::LocalFile => "(local file)",
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A digest plus what was hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedContent {
    pub digest: Digest,
    pub byte_len: u64,
    pub source: SourceDescriptor,
}

/// Errors while acquiring bytes to hash.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Fetch failed: {status} {reason}")]
    FetchStatus { status: u16, reason: String },

    #[error("Input too large: more than {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("No file selected")]
    NoInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Hashes files and URLs with shared limits and one HTTP client.
#[derive(Debug, Clone)]
pub struct ContentHasher {
    http: reqwest::Client,
    max_bytes: Option<u64>,
}

impl ContentHasher {
    pub fn new(max_bytes: Option<u64>, fetch_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { http, max_bytes }
    }

    /// Hash bytes already in memory (uploads).
    pub fn hash_bytes(&self, bytes: &[u8], source: SourceDescriptor) -> Result<HashedContent, HashError> {
        self.check_len(bytes.len() as u64)?;
        Ok(HashedContent {
            digest: Digest::of(bytes),
            byte_len: bytes.len() as u64,
            source,
        })
    }

    /// Read and hash a local file.
    pub async fn hash_file(&self, path: &Path) -> Result<HashedContent, HashError> {
        let file = tokio::fs::File::open(path).await?;
        let mut buf = Vec::new();
        match self.max_bytes {
            Some(limit) => {
                // one extra byte tells us the cap was crossed
                file.take(limit + 1).read_to_end(&mut buf).await?;
            }
            None => {
                let mut file = file;
                file.read_to_end(&mut buf).await?;
            }
        }
        self.hash_bytes(&buf, SourceDescriptor::LocalFile)
    }

    /// Download and hash a remote resource.
    pub async fn hash_url(&self, url: &str) -> Result<HashedContent, HashError> {
        tracing::debug!(url = %url, "Downloading media");

        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| HashError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HashError::FetchStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        if let Some(len) = response.content_length() {
            self.check_len(len)?;
        }

        let mut buf = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| HashError::Fetch(e.to_string()))?
        {
            buf.extend_from_slice(&chunk);
            self.check_len(buf.len() as u64)?;
        }

        let hashed = self.hash_bytes(&buf, SourceDescriptor::Url(url.to_string()))?;
        tracing::info!(url = %url, bytes = hashed.byte_len, digest = %hashed.digest, "Hash ready");
        Ok(hashed)
    }

    fn check_len(&self, len: u64) -> Result<(), HashError> {
        match self.max_bytes {
            Some(limit) if len > limit => Err(HashError::TooLarge { limit }),
            _ => Ok(()),
        }
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(None, Duration::from_secs(30))
    }
}
