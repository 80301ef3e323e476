//! Timestamp trust scenarios: every way a token can fail
//! `VALIDATE_TOKEN_TIMESTAMP` or `COMPARE_TOKEN_TIMESTAMP`, each with a
//! distinct detail.

use lock_tests::fixtures::{
    operations, run, token_info, tree_of, FixtureSigner, Pki, SealParts, GEN_TIME, NOT_AFTER,
    NOT_BEFORE, ROOT_ALIAS,
};
use seal_harness::orchestrator::VerificationOutcome;
use seal_kernel::proof::hash::HashDomain;
use seal_kernel::token::trust_store::{TrustAnchor, TrustStore};
use seal_kernel::token::types::TimestampTokenV1;
use seal_kernel::token::writer::{assemble_token, token_info_bytes};
use seal_kernel::verdict::{CheckName, StatusCode};

fn root_hash() -> [u8; 32] {
    tree_of(&operations(3)).root()
}

fn verify(token: &TimestampTokenV1, trust: TrustStore) -> VerificationOutcome {
    let pki = Pki::new();
    let parts = SealParts::build("seal-ts", &operations(3), &pki).with_token(token);
    let staging = tempfile::tempdir().unwrap();
    run(&parts, trust, staging.path())
}

fn validate_detail(outcome: &VerificationOutcome) -> String {
    let verdict = outcome
        .sub_verdicts
        .iter()
        .find(|v| v.check == CheckName::ValidateTokenTimestamp)
        .unwrap();
    assert_eq!(verdict.status, StatusCode::Ko, "{verdict:?}");
    assert_eq!(
        outcome.check(CheckName::CompareTokenTimestamp),
        Some(StatusCode::Ok),
        "imprint should still match"
    );
    assert_eq!(outcome.status, StatusCode::Ko);
    verdict.detail.clone().unwrap()
}

#[test]
fn signer_alone_verifies_through_issuing_anchor() {
    let pki = Pki::new();
    let token = pki.timestamp_with_chain(&root_hash(), GEN_TIME, vec![pki.tsa_cert.clone()]);
    let outcome = verify(&token, pki.trust_store());
    assert_eq!(outcome.status, StatusCode::Ok, "{outcome:#?}");
}

#[test]
fn token_signed_by_other_key_is_rejected() {
    let pki = Pki::new();
    let info = token_info(&root_hash(), GEN_TIME);
    let forger = FixtureSigner::ed25519(9);
    let signature = forger.sign(HashDomain::TokenInfo, &token_info_bytes(&info).unwrap());
    let token = assemble_token(info, forger.algorithm(), signature, pki.chain()).unwrap();

    let detail = validate_detail(&verify(&token, pki.trust_store()));
    assert!(detail.contains("token signature"), "{detail}");
}

#[test]
fn broken_chain_link_is_rejected() {
    let pki = Pki::new();
    let impostor = FixtureSigner::ed25519(9);
    let tsa_cert = impostor.certify(
        "Fixture TSA",
        "Fixture Root",
        &pki.tsa,
        (NOT_BEFORE, NOT_AFTER),
    );
    let token = pki.timestamp_with_chain(
        &root_hash(),
        GEN_TIME,
        vec![tsa_cert, pki.root_cert.clone()],
    );

    let detail = validate_detail(&verify(&token, pki.trust_store()));
    assert!(detail.contains("certificate 0"), "{detail}");
}

#[test]
fn issuer_name_mismatch_is_rejected() {
    let pki = Pki::new();
    let tsa_cert = pki.root.certify(
        "Fixture TSA",
        "Some Other CA",
        &pki.tsa,
        (NOT_BEFORE, NOT_AFTER),
    );
    let token = pki.timestamp_with_chain(
        &root_hash(),
        GEN_TIME,
        vec![tsa_cert, pki.root_cert.clone()],
    );

    let detail = validate_detail(&verify(&token, pki.trust_store()));
    assert!(detail.contains("Some Other CA"), "{detail}");
}

#[test]
fn expired_signer_is_rejected() {
    let pki = Pki::new();
    let tsa_cert = pki.root.certify(
        "Fixture TSA",
        "Fixture Root",
        &pki.tsa,
        (NOT_BEFORE, GEN_TIME - 1),
    );
    let token = pki.timestamp_with_chain(
        &root_hash(),
        GEN_TIME,
        vec![tsa_cert, pki.root_cert.clone()],
    );

    let detail = validate_detail(&verify(&token, pki.trust_store()));
    assert!(detail.contains("signing time"), "{detail}");
}

#[test]
fn root_expired_before_signing_time_is_rejected() {
    let pki = Pki::new();
    let stale_root = pki.root.certify(
        "Fixture Root",
        "Fixture Root",
        &pki.root,
        (NOT_BEFORE, GEN_TIME - 60),
    );
    let token = pki.timestamp_with_chain(
        &root_hash(),
        GEN_TIME,
        vec![pki.tsa_cert.clone(), stale_root],
    );

    let detail = validate_detail(&verify(&token, pki.trust_store()));
    assert!(detail.contains("certificate 1 validity"), "{detail}");
}

#[test]
fn foreign_root_is_untrusted() {
    let pki = Pki::new();
    let foreign = Pki::with_keys(FixtureSigner::ed25519(3), FixtureSigner::ed25519(4));
    let token = pki.timestamp(&root_hash(), GEN_TIME);

    let detail = validate_detail(&verify(&token, foreign.trust_store()));
    assert!(detail.contains("no trust anchor"), "{detail}");
}

#[test]
fn empty_trust_store_is_untrusted() {
    let pki = Pki::new();
    let token = pki.timestamp(&root_hash(), GEN_TIME);
    let detail = validate_detail(&verify(&token, TrustStore::default()));
    assert!(detail.contains("no trust anchor"), "{detail}");
}

#[test]
fn two_matching_anchors_are_ambiguous() {
    let pki = Pki::new();
    let store = TrustStore::new(vec![
        TrustAnchor {
            alias: ROOT_ALIAS.into(),
            certificate: pki.root_cert.clone(),
        },
        TrustAnchor {
            alias: "fixture-root-copy".into(),
            certificate: pki.root_cert.clone(),
        },
    ])
    .unwrap();
    let token = pki.timestamp(&root_hash(), GEN_TIME);

    let detail = validate_detail(&verify(&token, store));
    assert!(detail.contains("fixture-root-copy"), "{detail}");
}

#[test]
fn non_sha256_imprint_fails_imprint_check_only() {
    let pki = Pki::new();
    let mut info = token_info(&root_hash(), GEN_TIME);
    info.hash_algorithm = "sha384".into();
    let signature = pki
        .tsa
        .sign(HashDomain::TokenInfo, &token_info_bytes(&info).unwrap());
    let token = assemble_token(info, pki.tsa.algorithm(), signature, pki.chain()).unwrap();

    let outcome = verify(&token, pki.trust_store());

    assert_eq!(outcome.status, StatusCode::Ko);
    assert_eq!(
        outcome.check(CheckName::CompareTokenTimestamp),
        Some(StatusCode::Ko)
    );
    assert_eq!(
        outcome.check(CheckName::ValidateTokenTimestamp),
        Some(StatusCode::Ok)
    );
}
