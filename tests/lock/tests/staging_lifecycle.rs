//! Staging lifecycle: the per-job directory exists only while the job runs.
//!
//! Proves:
//! 1. The staging directory is gone after OK, KO and FATAL outcomes
//! 2. A pre-existing staging directory is a FATAL conflict and is not touched
//! 3. The same request id can be reused once the previous job finished
//! 4. Staged artifact digests cover exactly the bytes in the container

use lock_tests::fixtures::{context, operations, orchestrator, run, Pki, SealParts};
use seal_harness::memory::{MemoryObjectStore, StaticTrustStore};
use seal_harness::orchestrator::Stage;
use seal_harness::staging::{OPERATIONS_MEMBER, TOKEN_MEMBER, TREE_MEMBER};
use seal_harness::store::TrustStoreLoadError;
use seal_kernel::proof::hash::{canonical_hash, HashDomain};
use seal_kernel::verdict::StatusCode;

fn staging_entries(root: &std::path::Path) -> usize {
    std::fs::read_dir(root).map_or(0, Iterator::count)
}

#[test]
fn staging_removed_after_ok() {
    let pki = Pki::new();
    let parts = SealParts::build("seal-life", &operations(4), &pki);
    let root = tempfile::tempdir().unwrap();

    let outcome = run(&parts, pki.trust_store(), root.path());

    assert_eq!(outcome.status, StatusCode::Ok, "{outcome:#?}");
    assert!(!root.path().join("1_lock").exists());
    assert_eq!(staging_entries(root.path()), 0);
}

#[test]
fn staging_removed_after_ko() {
    let pki = Pki::new();
    let mut parts = SealParts::build("seal-life", &operations(4), &pki);
    parts.manifest.element_count = Some(99);
    let root = tempfile::tempdir().unwrap();

    let outcome = run(&parts, pki.trust_store(), root.path());

    assert_eq!(outcome.status, StatusCode::Ko);
    assert_eq!(staging_entries(root.path()), 0);
}

#[test]
fn staging_removed_after_late_fault() {
    let pki = Pki::new();
    let parts = SealParts::build("seal-life", &operations(4), &pki);
    let root = tempfile::tempdir().unwrap();
    let orch = orchestrator(
        root.path(),
        vec![parts.manifest.clone()],
        MemoryObjectStore::new()
            .with_object(parts.manifest.container_name.clone(), parts.container()),
        StaticTrustStore::failing(TrustStoreLoadError::Io {
            detail: "offline".into(),
        }),
    );

    let outcome = orch.verify(&context("late"), &parts.manifest.seal_id);

    assert_eq!(outcome.status, StatusCode::Fatal);
    assert_eq!(
        outcome.stage(Stage::TimestampChecking).unwrap().status,
        StatusCode::Fatal
    );
    assert_eq!(staging_entries(root.path()), 0);
}

#[test]
fn existing_staging_directory_is_a_conflict_and_left_alone() {
    let pki = Pki::new();
    let parts = SealParts::build("seal-life", &operations(4), &pki);
    let root = tempfile::tempdir().unwrap();
    let occupied = root.path().join("1_lock");
    std::fs::create_dir(&occupied).unwrap();
    std::fs::write(occupied.join("keep.txt"), b"other job").unwrap();

    let outcome = run(&parts, pki.trust_store(), root.path());

    assert_eq!(outcome.status, StatusCode::Fatal);
    assert!(outcome.fault.as_ref().unwrap().contains("already exists"));
    assert!(outcome.stage(Stage::MerkleChecking).is_none());
    assert_eq!(
        std::fs::read(occupied.join("keep.txt")).unwrap(),
        b"other job"
    );
}

#[test]
fn request_id_reusable_after_completion() {
    let pki = Pki::new();
    let parts = SealParts::build("seal-life", &operations(2), &pki);
    let root = tempfile::tempdir().unwrap();

    let first = run(&parts, pki.trust_store(), root.path());
    let second = run(&parts, pki.trust_store(), root.path());

    assert_eq!(first.status, StatusCode::Ok);
    assert_eq!(second, first);
}

#[test]
fn staged_artifacts_digest_container_members() {
    let pki = Pki::new();
    let parts = SealParts::build("seal-life", &operations(3), &pki);
    let root = tempfile::tempdir().unwrap();

    let outcome = run(&parts, pki.trust_store(), root.path());

    let expected = [
        (OPERATIONS_MEMBER, &parts.operations_json),
        (TREE_MEMBER, &parts.tree_json),
        (TOKEN_MEMBER, &parts.token),
    ];
    assert_eq!(outcome.staged_artifacts.len(), expected.len());
    for (artifact, (name, bytes)) in outcome.staged_artifacts.iter().zip(expected) {
        assert_eq!(artifact.name, name);
        assert_eq!(artifact.size, bytes.len() as u64);
        assert_eq!(
            artifact.digest,
            canonical_hash(HashDomain::StagedArtifact, bytes)
        );
    }
}
