//! Receipt verification.
//!
//! Verification is local only: a freshly computed digest is compared with
//! the one carried in the verification link. No chain lookup.

use serde::Serialize;

use crate::hashing::Digest;

/// Payloads longer than this many UTF-16 code units pass the placeholder
/// credential check.
pub const PLACEHOLDER_MIN_LEN: usize = 10;

/// Outcome of a digest comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyStatus {
    /// Nothing to compare against.
    Idle,
    Match,
    #[serde(rename = "nomatch")]
    NoMatch,
}

impl VerifyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyStatus::Idle => "idle",
            VerifyStatus::Match => "match",
            VerifyStatus::NoMatch => "nomatch",
        }
    }
}

/// Compare `actual` with the expected hex digest, ignoring case and an
/// optional `0x` prefix on the expected side.
pub fn compare(expected: Option<&str>, actual: &Digest) -> VerifyStatus {
    match expected.map(str::trim).filter(|e| !e.is_empty()) {
        None => VerifyStatus::Idle,
        Some(expected) if actual.matches_hex(expected) => VerifyStatus::Match,
        Some(_) => VerifyStatus::NoMatch,
    }
}

/// Result of the placeholder credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialCheck {
    pub ok: bool,
    pub message: &'static str,
}

/// Length-only stand-in for real credential verification: any payload
/// longer than [`PLACEHOLDER_MIN_LEN`] UTF-16 code units is accepted, the
/// way browser clients measure string length.
pub fn placeholder_validity(payload: &str) -> CredentialCheck {
    if payload.encode_utf16().count() > PLACEHOLDER_MIN_LEN {
        CredentialCheck {
            ok: true,
            message: "Credential looks valid",
        }
    } else {
        CredentialCheck {
            ok: false,
            message: "Invalid credential",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare() {
        let digest = Digest::of(b"hello");
        let plain = digest.to_plain_hex();

        assert_eq!(compare(None, &digest), VerifyStatus::Idle);
        assert_eq!(compare(Some("  "), &digest), VerifyStatus::Idle);
        assert_eq!(compare(Some(&plain), &digest), VerifyStatus::Match);
        assert_eq!(compare(Some(&plain.to_uppercase()), &digest), VerifyStatus::Match);
        assert_eq!(compare(Some(&digest.to_string()), &digest), VerifyStatus::Match);
        assert_eq!(compare(Some("0xdeadbeef"), &digest), VerifyStatus::NoMatch);
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_value(VerifyStatus::NoMatch).unwrap(), "nomatch");
        assert_eq!(serde_json::to_value(VerifyStatus::Match).unwrap(), "match");
        assert_eq!(VerifyStatus::Idle.as_str(), "idle");
    }

    #[test]
    fn test_placeholder_validity() {
        assert!(!placeholder_validity("short").ok);
        assert!(!placeholder_validity("exactly10!").ok);
        let ok = placeholder_validity("eleven char");
        assert!(ok.ok);
        assert_eq!(ok.message, "Credential looks valid");
    }

    #[test]
    fn test_placeholder_counts_utf16_units() {
        // six astral chars are twelve UTF-16 units
        assert!(placeholder_validity("😀😀😀😀😀😀").ok);
        // ten BMP chars stay at ten units
        assert!(!placeholder_validity("éééééééééé").ok);
    }
}
