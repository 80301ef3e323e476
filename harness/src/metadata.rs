//! `SealMetadataReader`: resolve a seal id to its logged manifest.

use seal_kernel::seal::manifest::SealManifest;
use seal_kernel::verdict::CheckName;
use tracing::{debug, instrument, warn};

use crate::context::VerificationContext;
use crate::error::{FatalFault, Rejection};
use crate::store::{LogStore, LogStoreError};

/// Reads seal manifests from the operation log.
#[derive(Debug)]
pub struct SealMetadataReader<L> {
    log_store: L,
    expected_category: String,
}

impl<L: LogStore> SealMetadataReader<L> {
    pub fn new(log_store: L, expected_category: impl Into<String>) -> Self {
        Self {
            log_store,
            expected_category: expected_category.into(),
        }
    }

    /// The single manifest logged for `seal_id`.
    ///
    /// # Errors
    ///
    /// - [`Rejection::Fatal`] if the log is unreachable or holds zero or
    ///   several records for `seal_id`.
    /// - [`Rejection::Mismatch`] on [`CheckName::CheckSealCategory`] if the
    ///   record's category is not the expected one.
    #[instrument(level = "debug", skip(self, ctx))]
    pub fn read(&self, ctx: &VerificationContext, seal_id: &str) -> Result<SealManifest, Rejection> {
        let mut records = self
            .log_store
            .seal_records(ctx, seal_id)
            .map_err(|e| match e {
                LogStoreError::Unavailable { detail } | LogStoreError::Corrupt { detail } => {
                    FatalFault::LogStoreUnavailable { detail }
                }
            })?;

        let manifest = match records.len() {
            0 => {
                return Err(FatalFault::SealNotFound {
                    seal_id: seal_id.into(),
                }
                .into())
            }
            1 => records.remove(0),
            count => {
                return Err(FatalFault::DuplicateSealRecords {
                    seal_id: seal_id.into(),
                    count,
                }
                .into())
            }
        };

        if manifest.category != self.expected_category {
            warn!(
                category = %manifest.category,
                expected = %self.expected_category,
                "seal has the wrong category"
            );
            return Err(Rejection::Mismatch {
                check: CheckName::CheckSealCategory,
                detail: format!(
                    "category {} is not {}",
                    manifest.category, self.expected_category
                ),
            });
        }

        debug!(container = %manifest.container_name, "seal manifest resolved");
        Ok(manifest)
    }
}
