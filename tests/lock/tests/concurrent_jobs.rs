//! Concurrent jobs: one orchestrator instance serves several jobs at once.
//! Distinct request ids get distinct staging areas and identical verdicts.

use std::thread;

use lock_tests::fixtures::{context, operations, orchestrator, Pki, SealParts};
use seal_harness::memory::{MemoryObjectStore, StaticTrustStore};
use seal_kernel::verdict::StatusCode;

#[test]
fn parallel_jobs_share_one_orchestrator() {
    let pki = Pki::new();
    let good = SealParts::build("seal-a", &operations(5), &pki);
    let mut bad = SealParts::build("seal-b", &operations(3), &pki);
    bad.manifest.element_count = Some(4);

    let root = tempfile::tempdir().unwrap();
    let orch = orchestrator(
        root.path(),
        vec![good.manifest.clone(), bad.manifest.clone()],
        MemoryObjectStore::new()
            .with_object(good.manifest.container_name.clone(), good.container())
            .with_object(bad.manifest.container_name.clone(), bad.container()),
        StaticTrustStore::new(pki.trust_store()),
    );

    let outcomes = thread::scope(|scope| {
        let jobs: Vec<_> = (0..8)
            .map(|i| {
                let orch = &orch;
                let seal_id = if i % 2 == 0 { "seal-a" } else { "seal-b" };
                scope.spawn(move || orch.verify(&context(&format!("job-{i}")), seal_id))
            })
            .collect();
        jobs.into_iter()
            .map(|job| job.join().unwrap())
            .collect::<Vec<_>>()
    });

    for (i, outcome) in outcomes.iter().enumerate() {
        assert_eq!(outcome.request_id, format!("job-{i}"));
        let expected = if i % 2 == 0 {
            StatusCode::Ok
        } else {
            StatusCode::Ko
        };
        assert_eq!(outcome.status, expected, "job {i}: {outcome:#?}");
    }
    assert_eq!(outcomes[0].checks, outcomes[2].checks);
    assert_eq!(outcomes[1].sub_verdicts, outcomes[3].sub_verdicts);
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn same_request_id_in_flight_conflicts_or_succeeds() {
    let pki = Pki::new();
    let parts = SealParts::build("seal-a", &operations(5), &pki);
    let root = tempfile::tempdir().unwrap();
    let orch = orchestrator(
        root.path(),
        vec![parts.manifest.clone()],
        MemoryObjectStore::new()
            .with_object(parts.manifest.container_name.clone(), parts.container()),
        StaticTrustStore::new(pki.trust_store()),
    );

    let statuses = thread::scope(|scope| {
        let jobs: Vec<_> = (0..4)
            .map(|_| {
                let orch = &orch;
                scope.spawn(move || orch.verify(&context("shared"), "seal-a").status)
            })
            .collect();
        jobs.into_iter()
            .map(|job| job.join().unwrap())
            .collect::<Vec<_>>()
    });

    // Overlapping jobs with one id either finish OK or hit the staging
    // conflict; nothing in between.
    assert!(statuses
        .iter()
        .all(|s| matches!(s, StatusCode::Ok | StatusCode::Fatal)));
    assert!(statuses.contains(&StatusCode::Ok));
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}
