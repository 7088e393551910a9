//! SHA-256 digests of buffered content.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use thiserror::Error;

/// Name written into anchor payloads.
pub const ALGORITHM: &str = "sha256";

/// A 32-byte SHA-256 digest, displayed as `0x` + lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

/// Errors from parsing a digest string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigestParseError {
    #[error("digest must be 64 hex chars, got {0}")]
    Length(usize),

    #[error("digest contains non-hex characters")]
    NotHex,
}

impl Digest {
    /// Hash a byte slice.
    pub fn of(bytes: &[u8]) -> Self {
        let hash = Sha256::digest(bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&hash);
        Self(out)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex without the `0x` prefix.
    pub fn to_plain_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Case-insensitive comparison against a user-supplied hex string,
    /// with or without `0x`.
    pub fn matches_hex(&self, candidate: &str) -> bool {
        strip_hex_prefix(candidate.trim()).eq_ignore_ascii_case(&self.to_plain_hex())
    }
}

/// Strip a leading `0x`/`0X` if present.
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

impl FromStr for Digest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = strip_hex_prefix(s);
        if cleaned.len() != 64 {
            return Err(DigestParseError::Length(cleaned.len()));
        }
        let mut out = [0u8; 32];
        hex::decode_to_slice(cleaned, &mut out).map_err(|_| DigestParseError::NotHex)?;
        Ok(Self(out))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_plain_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // sha256("abc")
        assert_eq!(
            Digest::of(b"abc").to_string(),
            "0xba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_deterministic() {
        let data = b"the same bytes, hashed twice";
        assert_eq!(Digest::of(data), Digest::of(data));
    }

    #[test]
    fn test_single_byte_change() {
        let original: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let base = Digest::of(&original);

        for pos in [0usize, 1, 511, 2048, 4095] {
            let mut flipped = original.clone();
            flipped[pos] ^= 0x01;
            let changed = Digest::of(&flipped);
            assert_ne!(base, changed, "flip at {} kept the digest", pos);

            // roughly half the bits should differ
            let differing: u32 = base
                .as_bytes()
                .iter()
                .zip(changed.as_bytes())
                .map(|(a, b)| (a ^ b).count_ones())
                .sum();
            assert!((64..=192).contains(&differing), "only {} bits differ", differing);
        }
    }

    #[test]
    fn test_parse_with_and_without_prefix() {
        let d = Digest::of(b"x");
        let plain: Digest = d.to_plain_hex().parse().unwrap();
        let prefixed: Digest = d.to_string().parse().unwrap();
        let upper: Digest = d.to_plain_hex().to_uppercase().parse().unwrap();
        assert_eq!(plain, d);
        assert_eq!(prefixed, d);
        assert_eq!(upper, d);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("abc".parse::<Digest>(), Err(DigestParseError::Length(3)));
        assert_eq!(
            "zz".repeat(32).parse::<Digest>(),
            Err(DigestParseError::NotHex)
        );
    }

    #[test]
    fn test_matches_hex_case_insensitive() {
        let d = Digest::of(b"credential.pdf");
        assert!(d.matches_hex(&d.to_plain_hex().to_uppercase()));
        assert!(d.matches_hex(&d.to_string()));
        assert!(!d.matches_hex(&Digest::of(b"other").to_string()));
    }

    #[test]
    fn test_serde_as_string() {
        let d = Digest::of(b"abc");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", d));
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
