//! Status lattice and per-check sub-verdicts.
//!
//! `OK < WARNING < KO < FATAL`. Aggregation is "worst wins" over the derived
//! `Ord`; variant order below is the lattice order and must not change.

use serde::{Deserialize, Serialize};

/// Outcome status of one check, one stage, or a whole verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusCode {
    Ok,
    Warning,
    Ko,
    Fatal,
}

impl StatusCode {
    /// The more severe of two statuses.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    /// Fold any number of statuses; an empty input is `Ok`.
    pub fn worst_of<I: IntoIterator<Item = Self>>(statuses: I) -> Self {
        statuses.into_iter().fold(Self::Ok, Self::worst)
    }

    /// Upper-case wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Ko => "KO",
            Self::Fatal => "FATAL",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named checks a verification can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckName {
    /// Manifest category is the traceability category.
    CheckSealCategory,
    /// Recomputed root equals the manifest's declared root.
    CompareMerkleHashWithIndexedHash,
    /// Recomputed root equals the root secured in the timestamp token.
    CompareMerkleHashWithSavedHash,
    /// Operations lie inside the seal period and match the declared count.
    CheckOperationsWithinSealPeriod,
    /// Rebuilt tree equals the serialized tree.
    CompareMerkleTreeWithSavedTree,
    /// Token imprint equals the recomputed root.
    CompareTokenTimestamp,
    /// Token signature and signer chain validate against the trust store.
    ValidateTokenTimestamp,
}

impl CheckName {
    /// Wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckSealCategory => "CHECK_SEAL_CATEGORY",
            Self::CompareMerkleHashWithIndexedHash => "COMPARE_MERKLE_HASH_WITH_INDEXED_HASH",
            Self::CompareMerkleHashWithSavedHash => "COMPARE_MERKLE_HASH_WITH_SAVED_HASH",
            Self::CheckOperationsWithinSealPeriod => "CHECK_OPERATIONS_WITHIN_SEAL_PERIOD",
            Self::CompareMerkleTreeWithSavedTree => "COMPARE_MERKLE_TREE_WITH_SAVED_TREE",
            Self::CompareTokenTimestamp => "COMPARE_TOKEN_TIMESTAMP",
            Self::ValidateTokenTimestamp => "VALIDATE_TOKEN_TIMESTAMP",
        }
    }

    /// Status this check reports when it fails, unless the failure carries
    /// its own status.
    #[must_use]
    pub fn failure_status(self) -> StatusCode {
        match self {
            Self::CompareMerkleTreeWithSavedTree => StatusCode::Warning,
            _ => StatusCode::Ko,
        }
    }
}

impl std::fmt::Display for CheckName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubVerdict {
    pub check: CheckName,
    pub status: StatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SubVerdict {
    #[must_use]
    pub fn ok(check: CheckName) -> Self {
        Self {
            check,
            status: StatusCode::Ok,
            detail: None,
        }
    }

    /// A failed check at its [`CheckName::failure_status`].
    #[must_use]
    pub fn failed(check: CheckName, detail: impl Into<String>) -> Self {
        Self {
            check,
            status: check.failure_status(),
            detail: Some(detail.into()),
        }
    }

    /// A failed check at an explicit status.
    #[must_use]
    pub fn failed_with(check: CheckName, status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            check,
            status,
            detail: Some(detail.into()),
        }
    }

    /// `ok` when `passed`, otherwise `failed` with the lazily built detail.
    pub fn from_check(check: CheckName, passed: bool, detail: impl FnOnce() -> String) -> Self {
        if passed {
            Self::ok(check)
        } else {
            Self::failed(check, detail())
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::Ok
    }
}
