//! `SealVerificationOrchestrator`: run the stages of one verification job
//! and aggregate their verdicts.
//!
//! ```text
//! Preparing ──▶ MerkleChecking ──▶ TimestampChecking ──▶ Done
//!     │               │                   │
//!     └── fault ──────┴────── fault ──────┴──────────────▶ Done
//! ```
//!
//! Stages run strictly in order on the calling thread. A fault ends the job
//! at once; later stages are not entered and report nothing. A rejected
//! category also ends the job after `Preparing`, before any fetch. Every
//! other check failure is recorded and the job continues.
//!
//! The overall status is FATAL if any fault occurred (including failing to
//! remove the staging area), otherwise the worst sub-verdict status.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use seal_kernel::proof::hash::ContentHash;
use seal_kernel::seal::manifest::SealManifest;
use seal_kernel::verdict::{CheckName, StatusCode, SubVerdict};

use crate::config::VerifyConfig;
use crate::context::VerificationContext;
use crate::error::{FatalFault, Rejection};
use crate::merkle_stage::MerkleVerifier;
use crate::metadata::SealMetadataReader;
use crate::staging::{ContainerStager, StagedArtifact, StagedContainer};
use crate::store::{LogStore, ObjectStore, TrustStoreLoader};
use crate::timestamp_stage::TimestampVerifier;

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Preparing,
    MerkleChecking,
    TimestampChecking,
    Done,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::MerkleChecking => "merkle_checking",
            Self::TimestampChecking => "timestamp_checking",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one entered stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

/// Full result of one verification job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    pub seal_id: String,
    pub tenant: u32,
    pub request_id: String,
    pub status: StatusCode,
    /// Sub-status keyed by check name.
    pub checks: BTreeMap<CheckName, StatusCode>,
    pub sub_verdicts: Vec<SubVerdict>,
    pub stages: Vec<StageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recomputed_root: Option<ContentHash>,
    pub staged_artifacts: Vec<StagedArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

impl VerificationOutcome {
    /// Status of `check`, if it ran.
    #[must_use]
    pub fn check(&self, check: CheckName) -> Option<StatusCode> {
        self.checks.get(&check).copied()
    }

    /// The report of `stage`, if it was entered.
    #[must_use]
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }
}

/// Sequences metadata, staging, Merkle and timestamp verification.
///
/// Holds no mutable state: one instance can serve concurrent jobs as long
/// as their contexts differ.
#[derive(Debug)]
pub struct SealVerificationOrchestrator<L, O, T> {
    metadata: SealMetadataReader<L>,
    stager: ContainerStager<O>,
    merkle: MerkleVerifier,
    timestamp: TimestampVerifier<T>,
}

impl<L, O, T> SealVerificationOrchestrator<L, O, T>
where
    L: LogStore,
    O: ObjectStore,
    T: TrustStoreLoader,
{
    pub fn new(config: &VerifyConfig, log_store: L, object_store: O, trust_loader: T) -> Self {
        Self {
            metadata: SealMetadataReader::new(log_store, config.expected_category.clone()),
            stager: ContainerStager::new(
                object_store,
                config.staging_root.clone(),
                config.max_member_bytes,
            ),
            merkle: MerkleVerifier::new(),
            timestamp: TimestampVerifier::new(trust_loader),
        }
    }

    /// Verify `seal_id` and report every check that ran.
    pub fn verify(&self, ctx: &VerificationContext, seal_id: &str) -> VerificationOutcome {
        let span = info_span!(
            "seal_verification",
            tenant = ctx.tenant(),
            request_id = ctx.request_id(),
            seal_id
        );
        let _entered = span.enter();

        let mut run = Run::default();
        let staged = self.prepare(ctx, seal_id, &mut run);
        if let Some((manifest, staged)) = &staged {
            self.check(ctx, manifest, staged, &mut run);
        }
        run.finish(ctx, seal_id, staged.map(|(_, staged)| staged))
    }

    fn prepare(
        &self,
        ctx: &VerificationContext,
        seal_id: &str,
        run: &mut Run,
    ) -> Option<(SealManifest, StagedContainer)> {
        run.enter(Stage::Preparing);
        let manifest = match self.metadata.read(ctx, seal_id) {
            Ok(manifest) => manifest,
            Err(Rejection::Fatal(fault)) => {
                run.fail(Stage::Preparing, fault);
                return None;
            }
            Err(Rejection::Mismatch { check, detail }) => {
                run.record([SubVerdict::failed(check, detail)]);
                run.complete(Stage::Preparing);
                return None;
            }
        };
        run.record([SubVerdict::ok(CheckName::CheckSealCategory)]);

        match self.stager.stage(ctx, &manifest) {
            Ok(staged) => {
                run.artifacts = staged.artifacts().to_vec();
                run.complete(Stage::Preparing);
                Some((manifest, staged))
            }
            Err(fault) => {
                run.fail(Stage::Preparing, fault);
                None
            }
        }
    }

    fn check(
        &self,
        ctx: &VerificationContext,
        manifest: &SealManifest,
        staged: &StagedContainer,
        run: &mut Run,
    ) {
        run.enter(Stage::MerkleChecking);
        let merkle = match self.merkle.verify(ctx, manifest, staged) {
            Ok(output) => output,
            Err(fault) => {
                run.fail(Stage::MerkleChecking, fault);
                return;
            }
        };
        run.root = Some(merkle.root_hash());
        run.record(merkle.verdicts.iter().cloned());
        run.complete(Stage::MerkleChecking);

        run.enter(Stage::TimestampChecking);
        match self.timestamp.verify(ctx, &merkle.token, &merkle.root) {
            Ok(verdicts) => {
                run.record(verdicts);
                run.complete(Stage::TimestampChecking);
            }
            Err(fault) => run.fail(Stage::TimestampChecking, fault),
        }
    }
}

#[derive(Debug, Default)]
struct Run {
    verdicts: Vec<SubVerdict>,
    stages: Vec<StageReport>,
    stage_start: usize,
    root: Option<ContentHash>,
    artifacts: Vec<StagedArtifact>,
    fault: Option<FatalFault>,
}

impl Run {
    fn enter(&mut self, stage: Stage) {
        info!(%stage, "stage started");
        self.stage_start = self.verdicts.len();
    }

    fn record(&mut self, verdicts: impl IntoIterator<Item = SubVerdict>) {
        for verdict in verdicts {
            if verdict.is_ok() {
                debug!(check = %verdict.check, "check passed");
            } else {
                warn!(
                    check = %verdict.check,
                    status = %verdict.status,
                    detail = verdict.detail.as_deref().unwrap_or_default(),
                    "check failed"
                );
            }
            self.verdicts.push(verdict);
        }
    }

    fn complete(&mut self, stage: Stage) {
        let status = StatusCode::worst_of(
            self.verdicts
                .iter()
                .skip(self.stage_start)
                .map(|v| v.status),
        );
        self.stages.push(StageReport {
            stage,
            status,
            fault: None,
        });
    }

    fn fail(&mut self, stage: Stage, fault: FatalFault) {
        error!(%stage, error = %fault, "stage faulted");
        self.stages.push(StageReport {
            stage,
            status: StatusCode::Fatal,
            fault: Some(fault.to_string()),
        });
        self.fault = Some(fault);
    }

    fn finish(
        mut self,
        ctx: &VerificationContext,
        seal_id: &str,
        staged: Option<StagedContainer>,
    ) -> VerificationOutcome {
        let mut cleanup_fault = None;
        if let Some(staged) = staged {
            if let Err(fault) = staged.close() {
                error!(error = %fault, "staging area cleanup failed");
                cleanup_fault = Some(fault.to_string());
                self.fault.get_or_insert(fault);
            }
        }

        let status = if self.fault.is_some() {
            StatusCode::Fatal
        } else {
            StatusCode::worst_of(self.verdicts.iter().map(|v| v.status))
        };
        self.stages.push(StageReport {
            stage: Stage::Done,
            status,
            fault: cleanup_fault,
        });
        info!(%status, checks = self.verdicts.len(), "verification finished");

        VerificationOutcome {
            seal_id: seal_id.into(),
            tenant: ctx.tenant(),
            request_id: ctx.request_id().into(),
            status,
            checks: self.verdicts.iter().map(|v| (v.check, v.status)).collect(),
            sub_verdicts: self.verdicts,
            stages: self.stages,
            recomputed_root: self.root,
            staged_artifacts: self.artifacts,
            fault: self.fault.map(|f| f.to_string()),
        }
    }
}
