//! `operations.json`: the ordered operation records covered by a seal.
//!
//! ```json
//! {"schema_version":"seal_operations.v1",
//!  "operations":[{"id":"op-1","timestamp":"2024-01-01T00:00:00Z",
//!                 "type":"INGEST","payload_hash":"sha256:..."}]}
//! ```
//!
//! Record order is leaf order. The reader decodes every payload digest up
//! front so a bad digest surfaces as a parse error, never mid-build.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::proof::canon::{to_canonical_bytes, CanonError};
use crate::proof::hash::ContentHash;
use crate::proof::merkle::NodeHash;

/// Schema version of the operations document.
pub const OPERATIONS_SCHEMA_VERSION: &str = "seal_operations.v1";

/// One logged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload_hash: ContentHash,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct OperationsDocumentV1 {
    schema_version: String,
    operations: Vec<OperationRecord>,
}

/// Decoded operations document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedOperations {
    pub records: Vec<OperationRecord>,
    /// Raw payload digests, index-aligned with `records`.
    pub payload_digests: Vec<NodeHash>,
}

/// Errors from decoding `operations.json`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationsParseError {
    #[error("operations document is not valid JSON: {detail}")]
    InvalidJson { detail: String },
    #[error("unsupported operations schema: {found}")]
    UnsupportedSchema { found: String },
    #[error("operation {index} ({id}): bad payload hash: {detail}")]
    BadPayloadHash {
        index: usize,
        id: String,
        detail: String,
    },
}

/// Decode `operations.json` bytes.
///
/// # Errors
///
/// Returns [`OperationsParseError`] on malformed JSON, an unknown schema
/// version, or any payload hash that is not a SHA-256 `ContentHash`.
pub fn parse_operations(bytes: &[u8]) -> Result<StagedOperations, OperationsParseError> {
    let doc: OperationsDocumentV1 =
        serde_json::from_slice(bytes).map_err(|e| OperationsParseError::InvalidJson {
            detail: e.to_string(),
        })?;
    if doc.schema_version != OPERATIONS_SCHEMA_VERSION {
        return Err(OperationsParseError::UnsupportedSchema {
            found: doc.schema_version,
        });
    }

    let payload_digests = doc
        .operations
        .iter()
        .enumerate()
        .map(|(index, op)| {
            op.payload_hash
                .sha256_bytes()
                .map_err(|e| OperationsParseError::BadPayloadHash {
                    index,
                    id: op.id.clone(),
                    detail: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StagedOperations {
        records: doc.operations,
        payload_digests,
    })
}

/// Encode operation records as a canonical `operations.json` document.
///
/// # Errors
///
/// Returns [`CanonError`] if the records do not serialize.
pub fn operations_to_bytes(records: &[OperationRecord]) -> Result<Vec<u8>, CanonError> {
    to_canonical_bytes(&OperationsDocumentV1 {
        schema_version: OPERATIONS_SCHEMA_VERSION.into(),
        operations: records.to_vec(),
    })
}
