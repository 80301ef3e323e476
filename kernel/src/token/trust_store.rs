//! Trust store: the configured set of trusted certificates.
//!
//! ```json
//! {"anchors":[{"alias":"seal-root","certificate":"<hex of certificate encoding>"}],
//!  "schema_version":"trust_store.v1"}
//! ```

use serde::{Deserialize, Serialize};

use crate::proof::canon::{to_canonical_bytes, CanonError};
use crate::token::reader::bytes_to_certificate;
use crate::token::signature::{check_public_key, SignatureError};
use crate::token::types::{CertificateParseError, CertificateV1};

/// Schema version of the trust store document.
pub const TRUST_STORE_SCHEMA_VERSION: &str = "trust_store.v1";

/// One trusted certificate under a local alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    pub alias: String,
    pub certificate: CertificateV1,
}

/// Decoded trust store. May be empty; an empty store trusts nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustStore {
    anchors: Vec<TrustAnchor>,
}

impl TrustStore {
    /// Build a store from anchors.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreParseError::DuplicateAlias`] if two anchors share
    /// an alias, or [`TrustStoreParseError::BadAnchorKey`] if an anchor's
    /// public key does not decode under its declared algorithm.
    pub fn new(anchors: Vec<TrustAnchor>) -> Result<Self, TrustStoreParseError> {
        for (i, anchor) in anchors.iter().enumerate() {
            if anchors[..i].iter().any(|a| a.alias == anchor.alias) {
                return Err(TrustStoreParseError::DuplicateAlias {
                    alias: anchor.alias.clone(),
                });
            }
            let tbs = anchor.certificate.tbs();
            check_public_key(tbs.key_algorithm, &tbs.public_key).map_err(|source| {
                TrustStoreParseError::BadAnchorKey {
                    alias: anchor.alias.clone(),
                    source,
                }
            })?;
        }
        Ok(Self { anchors })
    }

    #[must_use]
    pub fn anchors(&self) -> &[TrustAnchor] {
        &self.anchors
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnchorEntryV1 {
    alias: String,
    certificate: String,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrustStoreDocumentV1 {
    schema_version: String,
    anchors: Vec<AnchorEntryV1>,
}

/// Errors from decoding a trust store document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrustStoreParseError {
    #[error("trust store is not valid JSON: {detail}")]
    InvalidJson { detail: String },
    #[error("unsupported trust store schema: {found}")]
    UnsupportedSchema { found: String },
    #[error("anchor {alias}: certificate is not hex: {detail}")]
    BadHex { alias: String, detail: String },
    #[error("anchor {alias}: {source}")]
    BadCertificate {
        alias: String,
        #[source]
        source: CertificateParseError,
    },
    #[error("anchor {alias}: {source}")]
    BadAnchorKey {
        alias: String,
        #[source]
        source: SignatureError,
    },
    #[error("duplicate anchor alias {alias}")]
    DuplicateAlias { alias: String },
}

/// Decode `trust_store.json` bytes.
///
/// # Errors
///
/// Returns [`TrustStoreParseError`] on malformed JSON, an unknown schema,
/// an undecodable certificate or anchor key, or a duplicate alias.
pub fn parse_trust_store(bytes: &[u8]) -> Result<TrustStore, TrustStoreParseError> {
    let doc: TrustStoreDocumentV1 =
        serde_json::from_slice(bytes).map_err(|e| TrustStoreParseError::InvalidJson {
            detail: e.to_string(),
        })?;
    if doc.schema_version != TRUST_STORE_SCHEMA_VERSION {
        return Err(TrustStoreParseError::UnsupportedSchema {
            found: doc.schema_version,
        });
    }

    let anchors = doc
        .anchors
        .into_iter()
        .map(|entry| {
            let raw = hex::decode(&entry.certificate).map_err(|e| TrustStoreParseError::BadHex {
                alias: entry.alias.clone(),
                detail: e.to_string(),
            })?;
            let certificate = bytes_to_certificate(&raw).map_err(|source| {
                TrustStoreParseError::BadCertificate {
                    alias: entry.alias.clone(),
                    source,
                }
            })?;
            Ok(TrustAnchor {
                alias: entry.alias,
                certificate,
            })
        })
        .collect::<Result<Vec<_>, TrustStoreParseError>>()?;

    TrustStore::new(anchors)
}

/// Encode a trust store document.
///
/// # Errors
///
/// Returns [`CanonError`] if the document does not serialize.
pub fn trust_store_to_bytes(store: &TrustStore) -> Result<Vec<u8>, CanonError> {
    to_canonical_bytes(&TrustStoreDocumentV1 {
        schema_version: TRUST_STORE_SCHEMA_VERSION.into(),
        anchors: store
            .anchors
            .iter()
            .map(|a| AnchorEntryV1 {
                alias: a.alias.clone(),
                certificate: hex::encode(a.certificate.encoded()),
            })
            .collect(),
    })
}
