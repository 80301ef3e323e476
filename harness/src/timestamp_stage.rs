//! `TimestampVerifier`: imprint comparison and trust validation of the
//! staged timestamp token.

use tracing::{debug, instrument};

use seal_kernel::proof::merkle::NodeHash;
use seal_kernel::token::reader::bytes_to_token;
use seal_kernel::token::types::TimestampTokenV1;
use seal_kernel::token::validate::{compare_imprint, validate_token};
use seal_kernel::verdict::{CheckName, SubVerdict};

use crate::context::VerificationContext;
use crate::error::FatalFault;
use crate::staging::TOKEN_MEMBER;
use crate::store::TrustStoreLoader;

/// Decode the staged token.
///
/// # Errors
///
/// Returns [`FatalFault::MalformedArtifact`] if the bytes are not a valid
/// token.
pub fn read_staged_token(bytes: &[u8]) -> Result<TimestampTokenV1, FatalFault> {
    bytes_to_token(bytes).map_err(|e| FatalFault::MalformedArtifact {
        artifact: TOKEN_MEMBER.into(),
        detail: e.to_string(),
    })
}

/// Checks a token against the recomputed root and the trust store.
#[derive(Debug)]
pub struct TimestampVerifier<T> {
    loader: T,
}

impl<T: TrustStoreLoader> TimestampVerifier<T> {
    pub fn new(loader: T) -> Self {
        Self { loader }
    }

    /// Run `COMPARE_TOKEN_TIMESTAMP` and `VALIDATE_TOKEN_TIMESTAMP`.
    ///
    /// The trust store is loaded once per call, before either check.
    ///
    /// # Errors
    ///
    /// Returns [`FatalFault::TrustStoreUnavailable`] if the trust store
    /// cannot be loaded. Check failures are verdicts, not errors.
    #[instrument(level = "debug", skip_all)]
    pub fn verify(
        &self,
        ctx: &VerificationContext,
        token: &TimestampTokenV1,
        root: &NodeHash,
    ) -> Result<Vec<SubVerdict>, FatalFault> {
        let store =
            self.loader
                .load_trust_anchors(ctx)
                .map_err(|e| FatalFault::TrustStoreUnavailable {
                    detail: e.to_string(),
                })?;
        debug!(anchors = store.anchors().len(), "trust store loaded");

        let imprint = match compare_imprint(token, root) {
            Ok(()) => SubVerdict::ok(CheckName::CompareTokenTimestamp),
            Err(e) => SubVerdict::failed(CheckName::CompareTokenTimestamp, e.to_string()),
        };

        let trust = match validate_token(token, &store) {
            Ok(alias) => {
                debug!(anchor = %alias, serial = %token.info().serial, "token signer trusted");
                SubVerdict::ok(CheckName::ValidateTokenTimestamp)
            }
            Err(e) => SubVerdict::failed(CheckName::ValidateTokenTimestamp, e.to_string()),
        };

        Ok(vec![imprint, trust])
    }
}
