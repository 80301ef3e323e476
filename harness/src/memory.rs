//! In-memory collaborators for tests and embedding.
//!
//! Each store can be put into a failure mode so tests can drive every
//! FATAL path without touching a real backend.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use seal_kernel::seal::manifest::SealManifest;
use seal_kernel::token::trust_store::TrustStore;

use crate::context::VerificationContext;
use crate::store::{
    LogStore, LogStoreError, ObjectStore, ObjectStoreError, TrustStoreLoadError, TrustStoreLoader,
};

/// Log store over a fixed list of records.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    records: Vec<SealManifest>,
    failure: Option<LogStoreError>,
}

impl MemoryLogStore {
    #[must_use]
    pub fn new(records: Vec<SealManifest>) -> Self {
        Self {
            records,
            failure: None,
        }
    }

    /// A store whose every query fails with `error`.
    #[must_use]
    pub fn failing(error: LogStoreError) -> Self {
        Self {
            records: Vec::new(),
            failure: Some(error),
        }
    }
}

impl LogStore for MemoryLogStore {
    fn seal_records(
        &self,
        _ctx: &VerificationContext,
        seal_id: &str,
    ) -> Result<Vec<SealManifest>, LogStoreError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.seal_id == seal_id)
            .cloned()
            .collect())
    }
}

/// Object store over a name → bytes map. Counts fetches.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: BTreeMap<String, Vec<u8>>,
    failure: Option<ObjectStoreError>,
    fetches: AtomicUsize,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with_object(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.objects.insert(name.into(), bytes);
        self
    }

    /// A store whose every fetch fails with `error`.
    #[must_use]
    pub fn failing(error: ObjectStoreError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Number of `fetch_container` calls so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn fetch_container(
        &self,
        _ctx: &VerificationContext,
        name: &str,
    ) -> Result<Vec<u8>, ObjectStoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.objects
            .get(name)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound { name: name.into() })
    }
}

/// Trust store loader that hands out a fixed result.
#[derive(Debug, Clone)]
pub struct StaticTrustStore {
    result: Result<TrustStore, TrustStoreLoadError>,
}

impl StaticTrustStore {
    #[must_use]
    pub fn new(store: TrustStore) -> Self {
        Self { result: Ok(store) }
    }

    #[must_use]
    pub fn failing(error: TrustStoreLoadError) -> Self {
        Self { result: Err(error) }
    }
}

impl TrustStoreLoader for StaticTrustStore {
    fn load_trust_anchors(
        &self,
        _ctx: &VerificationContext,
    ) -> Result<TrustStore, TrustStoreLoadError> {
        self.result.clone()
    }
}
