//! Token and certificate types, limits, and parse errors.

use serde::{Deserialize, Serialize};

use crate::proof::hash::{domain_digest, HashDomain, SHA256_LEN};

/// Magic bytes at the start of every V1 token.
pub const TOKEN_V1_MAGIC: [u8; 4] = *b"TST1";

/// Maximum byte length of the token info section.
pub const MAX_INFO_LEN: usize = 64 * 1024;

/// Maximum byte length of one encoded certificate.
pub const MAX_CERT_LEN: usize = 64 * 1024;

/// Maximum number of certificates in a signer chain.
pub const MAX_CHAIN_LEN: usize = 8;

/// Signature schemes a token or certificate may be signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    #[serde(rename = "ed25519")]
    Ed25519,
    /// ECDSA over P-256 with SHA-256, fixed 64-byte `r || s` signatures.
    #[serde(rename = "ecdsa-p256")]
    EcdsaP256,
}

impl SignatureAlgorithm {
    /// Decode the one-byte wire tag.
    #[must_use]
    pub fn from_byte(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Ed25519),
            2 => Some(Self::EcdsaP256),
            _ => None,
        }
    }

    /// One-byte wire tag.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Ed25519 => 1,
            Self::EcdsaP256 => 2,
        }
    }

    /// Name as written in certificate TBS sections.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
            Self::EcdsaP256 => "ecdsa-p256",
        }
    }

    /// Encoded signature length. Both schemes use 64 bytes.
    #[must_use]
    pub fn signature_len(self) -> usize {
        64
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Signed content of a timestamp token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenInfoV1 {
    /// Signing time, unix seconds.
    pub gen_time: i64,
    /// Digest algorithm of the imprint, `"sha256"` for seals.
    pub hash_algorithm: String,
    /// The timestamped digest: for a seal, the Merkle root.
    #[serde(with = "hex")]
    pub message_imprint: Vec<u8>,
    pub policy: String,
    pub serial: String,
    /// Name of the issuing time-stamping authority.
    pub tsa: String,
}

/// Signed content of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertificateTbsV1 {
    pub issuer: String,
    pub key_algorithm: SignatureAlgorithm,
    /// Validity end, unix seconds, inclusive.
    pub not_after: i64,
    /// Validity start, unix seconds, inclusive.
    pub not_before: i64,
    /// Ed25519: 32 raw bytes. P-256: SEC1 encoded point.
    #[serde(with = "hex")]
    pub public_key: Vec<u8>,
    pub serial: String,
    pub subject: String,
}

impl CertificateTbsV1 {
    /// Whether `unix_seconds` lies inside `[not_before, not_after]`.
    #[must_use]
    pub fn is_valid_at(&self, unix_seconds: i64) -> bool {
        self.not_before <= unix_seconds && unix_seconds <= self.not_after
    }
}

/// A decoded certificate.
///
/// Built only by the reader or by [`super::writer::assemble_certificate`],
/// so `tbs_bytes` and `encoded` always match the decoded fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateV1 {
    pub(crate) tbs: CertificateTbsV1,
    pub(crate) tbs_bytes: Vec<u8>,
    pub(crate) signature_algorithm: SignatureAlgorithm,
    pub(crate) signature: Vec<u8>,
    pub(crate) encoded: Vec<u8>,
}

impl CertificateV1 {
    #[must_use]
    pub fn tbs(&self) -> &CertificateTbsV1 {
        &self.tbs
    }

    /// The exact canonical bytes the issuer signed.
    #[must_use]
    pub fn tbs_bytes(&self) -> &[u8] {
        &self.tbs_bytes
    }

    /// Algorithm of the issuer's signature over this certificate.
    #[must_use]
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Full wire encoding.
    #[must_use]
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Domain-separated digest of the full encoding.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; SHA256_LEN] {
        domain_digest(HashDomain::CertificateFingerprint, &[self.encoded.as_slice()])
    }

    /// Whether the certificate claims to be its own issuer.
    #[must_use]
    pub fn is_self_issued(&self) -> bool {
        self.tbs.issuer == self.tbs.subject
    }
}

/// A decoded timestamp token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampTokenV1 {
    pub(crate) info: TokenInfoV1,
    pub(crate) info_bytes: Vec<u8>,
    pub(crate) signature_algorithm: SignatureAlgorithm,
    pub(crate) signature: Vec<u8>,
    pub(crate) chain: Vec<CertificateV1>,
}

impl TimestampTokenV1 {
    #[must_use]
    pub fn info(&self) -> &TokenInfoV1 {
        &self.info
    }

    /// The exact canonical bytes the signer signed.
    #[must_use]
    pub fn info_bytes(&self) -> &[u8] {
        &self.info_bytes
    }

    #[must_use]
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Signer chain, signer first. Never empty.
    #[must_use]
    pub fn chain(&self) -> &[CertificateV1] {
        &self.chain
    }

    /// The signer certificate, `chain[0]`.
    #[must_use]
    pub fn signer(&self) -> Option<&CertificateV1> {
        self.chain.first()
    }
}

/// Errors from decoding a certificate encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CertificateParseError {
    #[error("certificate truncated: {detail}")]
    Truncated { detail: String },
    #[error("certificate TBS section is not canonical JSON: {detail}")]
    NotCanonical { detail: String },
    #[error("invalid certificate TBS: {detail}")]
    InvalidTbs { detail: String },
    #[error("unknown signature algorithm tag {tag}")]
    UnknownSignatureAlgorithm { tag: u8 },
    #[error("{algorithm} signature must be {expected} bytes, got {actual}")]
    BadSignatureLength {
        algorithm: SignatureAlgorithm,
        expected: usize,
        actual: usize,
    },
    #[error("{count} trailing bytes after certificate")]
    TrailingBytes { count: usize },
}

/// Errors from decoding a `TST1` token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenParseError {
    #[error("token truncated: {detail}")]
    Truncated { detail: String },
    #[error("bad token magic: {found:?}")]
    BadMagic { found: [u8; 4] },
    #[error("{section} section too long: {len} bytes")]
    SectionTooLong { section: String, len: usize },
    #[error("token info is not canonical JSON: {detail}")]
    NotCanonical { detail: String },
    #[error("invalid token info: {detail}")]
    InvalidInfo { detail: String },
    #[error("unknown signature algorithm tag {tag}")]
    UnknownSignatureAlgorithm { tag: u8 },
    #[error("{algorithm} signature must be {expected} bytes, got {actual}")]
    BadSignatureLength {
        algorithm: SignatureAlgorithm,
        expected: usize,
        actual: usize,
    },
    #[error("token has no signer certificate")]
    EmptyChain,
    #[error("signer chain of {count} certificates exceeds the limit")]
    ChainTooLong { count: usize },
    #[error("certificate {index}: {source}")]
    InvalidCertificate {
        index: usize,
        #[source]
        source: CertificateParseError,
    },
    #[error("{count} trailing bytes after token")]
    TrailingBytes { count: usize },
}
