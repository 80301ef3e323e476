//! Fatal faults and the tagged rejection type.
//!
//! A [`FatalFault`] means verification could not be carried out: something
//! needed was missing, unreachable, or undecodable. A
//! [`Rejection::Mismatch`] means verification ran and the seal failed a
//! named check. The two never mix: a fault is never reported as a check.

use seal_kernel::verdict::CheckName;

/// Infrastructure or decoding fault. Always forces the outcome to FATAL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FatalFault {
    #[error("seal {seal_id} not found in the operation log")]
    SealNotFound { seal_id: String },
    #[error("seal {seal_id} has {count} log records, expected one")]
    DuplicateSealRecords { seal_id: String, count: usize },
    #[error("operation log unavailable: {detail}")]
    LogStoreUnavailable { detail: String },
    #[error("container {name} not found in object storage")]
    ContainerNotFound { name: String },
    #[error("object storage unavailable: {detail}")]
    ObjectStoreUnavailable { detail: String },
    #[error("staging area {path} already exists")]
    StagingConflict { path: String },
    #[error("staging I/O failed: {detail}")]
    StagingIo { detail: String },
    #[error("container is corrupt: {detail}")]
    CorruptContainer { detail: String },
    #[error("container has no {name} member")]
    MissingMember { name: String },
    #[error("container member {name} exceeds {limit} bytes")]
    MemberTooLarge { name: String, limit: u64 },
    #[error("staged {artifact} is malformed: {detail}")]
    MalformedArtifact { artifact: String, detail: String },
    #[error("seal covers no operations")]
    EmptySeal,
    #[error("trust store unavailable: {detail}")]
    TrustStoreUnavailable { detail: String },
    #[error("failed to remove staging area {path}: {detail}")]
    StagingCleanup { path: String, detail: String },
}

/// Why a component refused to produce its result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error(transparent)]
    Fatal(#[from] FatalFault),
    #[error("{check} failed: {detail}")]
    Mismatch { check: CheckName, detail: String },
}
