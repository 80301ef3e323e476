//! Canonical hashing: `ContentHash` strings and domain-separated SHA-256.
//!
//! Algorithm: SHA-256 for every V1 artifact. String form is
//! `"sha256:<64 lowercase hex>"`, the same form the operation log stores for
//! payload digests and declared roots.
//!
//! **Exactly one place defines canonical hashing.** Callers pick a
//! [`HashDomain`]; raw `Sha256::new()` outside this module is a defect.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub use super::hash_domain::HashDomain;

/// Algorithm identifier for SHA-256 content hashes.
pub const SHA256_ALGORITHM: &str = "sha256";

/// Raw SHA-256 digest length in bytes.
pub const SHA256_LEN: usize = 32;

/// A content-addressed hash with algorithm identifier.
///
/// Format: `"algorithm:hex_digest"` (e.g., `"sha256:abcdef..."`)
///
/// Invariant: the inner string always contains exactly one `:` separator,
/// with non-empty substrings on both sides (enforced by [`ContentHash::parse`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash {
    /// Full string in `"algorithm:hex_digest"` format.
    full: String,
    /// Byte offset of the `:` separator (cached from parse).
    colon: usize,
}

/// Why a string or digest is not a usable SHA-256 content hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashParseError {
    /// Missing `:`, empty algorithm, or empty digest.
    #[error("not an \"algorithm:digest\" string: {raw}")]
    BadFormat { raw: String },
    /// Algorithm is not `sha256`.
    #[error("unsupported digest algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },
    /// Digest is not 64 lowercase hex characters.
    #[error("invalid sha256 digest: {detail}")]
    BadDigest { detail: String },
}

impl ContentHash {
    /// Parse from `"algorithm:hex"` format.
    ///
    /// Returns `None` if the format is invalid (missing colon,
    /// empty algorithm, or empty digest).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let colon = s.find(':')?;
        if colon == 0 || colon == s.len() - 1 {
            return None;
        }
        Some(Self {
            full: s.to_string(),
            colon,
        })
    }

    /// Parse and require a well-formed SHA-256 digest.
    ///
    /// # Errors
    ///
    /// Returns [`HashParseError`] if the string is not `"sha256:<64 hex>"`.
    pub fn parse_sha256(s: &str) -> Result<Self, HashParseError> {
        let hash = Self::parse(s).ok_or_else(|| HashParseError::BadFormat { raw: s.into() })?;
        hash.sha256_bytes()?;
        Ok(hash)
    }

    /// Wrap a raw SHA-256 digest.
    #[must_use]
    pub fn from_sha256(digest: &[u8; SHA256_LEN]) -> Self {
        Self {
            full: format!("{SHA256_ALGORITHM}:{}", hex::encode(digest)),
            colon: SHA256_ALGORITHM.len(),
        }
    }

    /// The algorithm portion (e.g., "sha256").
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.full[..self.colon]
    }

    /// The hex digest portion.
    #[must_use]
    pub fn hex_digest(&self) -> &str {
        &self.full[self.colon + 1..]
    }

    /// The full string representation (`"algorithm:hex_digest"`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Decode the digest as raw SHA-256 bytes.
    ///
    /// Uppercase hex is rejected: two spellings of one digest would make
    /// string comparison of declared hashes ambiguous.
    ///
    /// # Errors
    ///
    /// Returns [`HashParseError`] if the algorithm is not `sha256` or the
    /// digest is not exactly 64 lowercase hex characters.
    pub fn sha256_bytes(&self) -> Result<[u8; SHA256_LEN], HashParseError> {
        if self.algorithm() != SHA256_ALGORITHM {
            return Err(HashParseError::UnsupportedAlgorithm {
                algorithm: self.algorithm().to_string(),
            });
        }
        let digest = self.hex_digest();
        if digest.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(HashParseError::BadDigest {
                detail: "uppercase hex".into(),
            });
        }
        decode_digest(digest).map_err(|detail| HashParseError::BadDigest { detail })
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full)
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("not an \"algorithm:digest\" string: {raw}"))
        })
    }
}

/// Decode a 64-character hex string into a raw SHA-256 digest.
///
/// # Errors
///
/// Returns a description of the problem if the input is not valid hex or
/// not exactly 32 bytes long.
pub fn decode_digest(hex_str: &str) -> Result<[u8; SHA256_LEN], String> {
    let bytes = hex::decode(hex_str).map_err(|e| format!("hex decode: {e}"))?;
    <[u8; SHA256_LEN]>::try_from(bytes.as_slice())
        .map_err(|_| format!("expected {SHA256_LEN} bytes, got {}", bytes.len()))
}

/// Raw domain-separated SHA-256 over a sequence of byte parts.
///
/// Formula: `sha256(domain || parts[0] || parts[1] || ...)`.
#[must_use]
pub fn domain_digest(domain: HashDomain, parts: &[&[u8]]) -> [u8; SHA256_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Compute the canonical hash of a byte slice with domain separation.
///
/// Result format: `"sha256:<hex_digest>"`.
#[must_use]
pub fn canonical_hash(domain: HashDomain, data: &[u8]) -> ContentHash {
    ContentHash::from_sha256(&domain_digest(domain, &[data]))
}

/// Constant-time byte comparison for digests.
///
/// The length check returns early; digest lengths are not secret.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
