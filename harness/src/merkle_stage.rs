//! `MerkleVerifier`: rebuild the tree from staged operations and compare
//! its root with the logged and secured references.
//!
//! Every staged artifact is decoded before any check runs; a decode
//! failure is a fault, never a check result. Once decoded, the four checks
//! below run independently and all are reported:
//!
//! | Check | Reference | Failure |
//! |-------|-----------|---------|
//! | `COMPARE_MERKLE_HASH_WITH_INDEXED_HASH` | manifest declared root | KO |
//! | `COMPARE_MERKLE_HASH_WITH_SAVED_HASH` | token message imprint | KO |
//! | `CHECK_OPERATIONS_WITHIN_SEAL_PERIOD` | manifest period, element count | KO |
//! | `COMPARE_MERKLE_TREE_WITH_SAVED_TREE` | serialized tree | KO on root, else WARNING |

use tracing::{debug, instrument};

use seal_kernel::proof::hash::{constant_time_eq, ContentHash};
use seal_kernel::proof::merkle::{MerkleError, MerkleTree, NodeHash};
use seal_kernel::seal::manifest::SealManifest;
use seal_kernel::seal::operations::{parse_operations, OperationRecord};
use seal_kernel::seal::tree_doc::{first_divergence, parse_tree};
use seal_kernel::token::types::TimestampTokenV1;
use seal_kernel::verdict::{CheckName, SubVerdict};

use crate::context::VerificationContext;
use crate::error::FatalFault;
use crate::staging::{StagedContainer, OPERATIONS_MEMBER, TREE_MEMBER};
use crate::timestamp_stage::read_staged_token;

/// What the Merkle stage hands on to the timestamp stage.
#[derive(Debug, Clone)]
pub struct MerkleStageOutput {
    pub verdicts: Vec<SubVerdict>,
    pub root: NodeHash,
    /// The staged token, decoded once here.
    pub token: TimestampTokenV1,
}

impl MerkleStageOutput {
    #[must_use]
    pub fn root_hash(&self) -> ContentHash {
        ContentHash::from_sha256(&self.root)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MerkleVerifier;

impl MerkleVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decode the staged artifacts, rebuild the tree, and run the checks.
    ///
    /// # Errors
    ///
    /// Returns [`FatalFault::MalformedArtifact`] if any staged member fails
    /// to decode, and [`FatalFault::EmptySeal`] if the seal has no
    /// operations.
    #[instrument(level = "debug", skip_all)]
    pub fn verify(
        &self,
        _ctx: &VerificationContext,
        manifest: &SealManifest,
        staged: &StagedContainer,
    ) -> Result<MerkleStageOutput, FatalFault> {
        let operations = parse_operations(staged.operations_bytes()).map_err(|e| {
            FatalFault::MalformedArtifact {
                artifact: OPERATIONS_MEMBER.into(),
                detail: e.to_string(),
            }
        })?;
        let saved_tree =
            parse_tree(staged.tree_bytes()).map_err(|e| FatalFault::MalformedArtifact {
                artifact: TREE_MEMBER.into(),
                detail: e.to_string(),
            })?;
        let token = read_staged_token(staged.token_bytes())?;

        let tree = MerkleTree::from_payload_digests(&operations.payload_digests).map_err(
            |e| match e {
                MerkleError::EmptyLeafSet => FatalFault::EmptySeal,
            },
        )?;
        let root = tree.root();
        let root_hash = tree.root_hash();
        debug!(leaves = tree.leaf_count(), root = %root_hash, "tree rebuilt");

        let declared = &manifest.declared_root_hash;
        let indexed = SubVerdict::from_check(
            CheckName::CompareMerkleHashWithIndexedHash,
            declared
                .sha256_bytes()
                .is_ok_and(|d| constant_time_eq(&d, &root)),
            || format!("recomputed root {root_hash} differs from declared root {declared}"),
        );

        let imprint = &token.info().message_imprint;
        let secured = SubVerdict::from_check(
            CheckName::CompareMerkleHashWithSavedHash,
            constant_time_eq(imprint, &root),
            || {
                format!(
                    "recomputed root {root_hash} differs from token imprint {}",
                    hex::encode(imprint)
                )
            },
        );

        let period = match period_violation(manifest, &operations.records) {
            None => SubVerdict::ok(CheckName::CheckOperationsWithinSealPeriod),
            Some(detail) => SubVerdict::failed(CheckName::CheckOperationsWithinSealPeriod, detail),
        };

        let saved = match first_divergence(&tree, &saved_tree) {
            None => SubVerdict::ok(CheckName::CompareMerkleTreeWithSavedTree),
            Some(divergence) => SubVerdict::failed_with(
                CheckName::CompareMerkleTreeWithSavedTree,
                divergence.status(),
                divergence.to_string(),
            ),
        };

        Ok(MerkleStageOutput {
            verdicts: vec![indexed, secured, period, saved],
            root,
            token,
        })
    }
}

fn period_violation(manifest: &SealManifest, records: &[OperationRecord]) -> Option<String> {
    if let Some(outside) = records
        .iter()
        .find(|r| !manifest.period_contains(&r.timestamp))
    {
        return Some(format!(
            "operation {} at {} is outside [{}, {}]",
            outside.id,
            outside.timestamp.to_rfc3339(),
            manifest.period_start.to_rfc3339(),
            manifest.period_end.to_rfc3339()
        ));
    }
    match manifest.element_count {
        Some(declared) if u64::try_from(records.len()).ok() != Some(declared) => Some(format!(
            "seal declares {declared} operations, container holds {}",
            records.len()
        )),
        _ => None,
    }
}
