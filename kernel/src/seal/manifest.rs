//! `SealManifest`: the declared metadata of one seal, as logged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::proof::hash::ContentHash;

/// Category of seals over the operation log.
pub const TRACEABILITY_CATEGORY: &str = "TRACEABILITY";

/// Declared metadata of one seal.
///
/// `declared_root_hash` is the "logged" reference: the root recorded in the
/// operation log when the seal was produced, independent of the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealManifest {
    pub seal_id: String,
    pub category: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub declared_root_hash: ContentHash,
    #[serde(default)]
    pub previous_seal_id: Option<String>,
    /// Object-store key of the seal container.
    pub container_name: String,
    /// Number of sealed operations, when the producer recorded it.
    #[serde(default)]
    pub element_count: Option<u64>,
}

impl SealManifest {
    /// Whether `at` lies inside `[period_start, period_end]`, bounds included.
    ///
    /// An inverted period contains nothing.
    #[must_use]
    pub fn period_contains(&self, at: &DateTime<Utc>) -> bool {
        self.period_start <= *at && *at <= self.period_end
    }
}
