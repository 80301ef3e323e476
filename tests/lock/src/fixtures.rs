//! Seal fixture builders shared by the lock tests and the `seal_fixture`
//! binary.
//!
//! Everything here is deterministic: keys come from fixed seeds, times are
//! constants, payload digests are hashes of fixed strings. The same call
//! always yields byte-identical containers.
//!
//! # Panics
//!
//! Builders panic on encoding errors. These are test-only invariants.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::Signer as _;
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use seal_harness::config::VerifyConfig;
use seal_harness::context::VerificationContext;
use seal_harness::fs_store::{DirLogStore, DirObjectStore, FileTrustStoreLoader, FsStoreWriteError};
use seal_harness::memory::{MemoryLogStore, MemoryObjectStore, StaticTrustStore};
use seal_harness::orchestrator::{SealVerificationOrchestrator, VerificationOutcome};
use seal_harness::staging::{OPERATIONS_MEMBER, TOKEN_MEMBER, TREE_MEMBER};
use seal_kernel::proof::hash::{ContentHash, HashDomain};
use seal_kernel::proof::merkle::{MerkleTree, NodeHash};
use seal_kernel::seal::manifest::{SealManifest, TRACEABILITY_CATEGORY};
use seal_kernel::seal::operations::{operations_to_bytes, OperationRecord};
use seal_kernel::seal::tree_doc::tree_to_bytes;
use seal_kernel::token::signature::signing_input;
use seal_kernel::token::trust_store::{TrustAnchor, TrustStore};
use seal_kernel::token::types::{
    CertificateTbsV1, CertificateV1, SignatureAlgorithm, TimestampTokenV1, TokenInfoV1,
};
use seal_kernel::token::writer::{
    assemble_certificate, assemble_token, certificate_tbs_bytes, token_info_bytes, token_to_bytes,
};

/// Start of the fixture seal period.
pub const PERIOD_START: &str = "2024-01-01T00:00:00Z";
/// End of the fixture seal period.
pub const PERIOD_END: &str = "2024-01-01T23:59:59Z";
/// Token signing time: 2024-01-02T00:00:00Z.
pub const GEN_TIME: i64 = 1_704_153_600;
/// Certificate validity window, unix seconds.
pub const NOT_BEFORE: i64 = 1_700_000_000;
pub const NOT_AFTER: i64 = 1_800_000_000;
/// Alias of the fixture root anchor.
pub const ROOT_ALIAS: &str = "fixture-root";

/// Deterministic signing key of either supported algorithm.
pub enum FixtureSigner {
    Ed25519(ed25519_dalek::SigningKey),
    EcdsaP256(p256::ecdsa::SigningKey),
}

impl FixtureSigner {
    #[must_use]
    pub fn ed25519(seed: u8) -> Self {
        Self::Ed25519(ed25519_dalek::SigningKey::from_bytes(&[seed; 32]))
    }

    /// # Panics
    ///
    /// Panics if `seed` yields an invalid scalar (zero).
    #[must_use]
    pub fn p256(seed: u8) -> Self {
        Self::EcdsaP256(p256::ecdsa::SigningKey::from_slice(&[seed; 32]).unwrap())
    }

    #[must_use]
    pub fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            Self::Ed25519(_) => SignatureAlgorithm::Ed25519,
            Self::EcdsaP256(_) => SignatureAlgorithm::EcdsaP256,
        }
    }

    #[must_use]
    pub fn public_key(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(key) => key.verifying_key().to_bytes().to_vec(),
            Self::EcdsaP256(key) => key
                .verifying_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
        }
    }

    #[must_use]
    pub fn sign(&self, domain: HashDomain, section: &[u8]) -> Vec<u8> {
        let message = signing_input(domain, section);
        match self {
            Self::Ed25519(key) => key.sign(&message).to_bytes().to_vec(),
            Self::EcdsaP256(key) => {
                let signature: p256::ecdsa::Signature = key.sign(&message);
                signature.to_bytes().to_vec()
            }
        }
    }

    /// Issue a certificate for `subject_key`, signed by `self`.
    #[must_use]
    pub fn certify(
        &self,
        subject: &str,
        issuer: &str,
        subject_key: &FixtureSigner,
        validity: (i64, i64),
    ) -> CertificateV1 {
        let tbs = CertificateTbsV1 {
            issuer: issuer.into(),
            key_algorithm: subject_key.algorithm(),
            not_after: validity.1,
            not_before: validity.0,
            public_key: subject_key.public_key(),
            serial: format!("{subject}-1"),
            subject: subject.into(),
        };
        let signature = self.sign(
            HashDomain::CertificateTbs,
            &certificate_tbs_bytes(&tbs).unwrap(),
        );
        assemble_certificate(tbs, self.algorithm(), signature).unwrap()
    }
}

/// A root CA and a timestamping authority it certified.
pub struct Pki {
    pub root: FixtureSigner,
    pub tsa: FixtureSigner,
    pub root_cert: CertificateV1,
    pub tsa_cert: CertificateV1,
}

impl Pki {
    /// Ed25519 root, Ed25519 TSA.
    #[must_use]
    pub fn new() -> Self {
        Self::with_keys(FixtureSigner::ed25519(1), FixtureSigner::ed25519(2))
    }

    /// Ed25519 root, ECDSA P-256 TSA.
    #[must_use]
    pub fn mixed() -> Self {
        Self::with_keys(FixtureSigner::ed25519(1), FixtureSigner::p256(7))
    }

    #[must_use]
    pub fn with_keys(root: FixtureSigner, tsa: FixtureSigner) -> Self {
        let window = (NOT_BEFORE, NOT_AFTER);
        let root_cert = root.certify("Fixture Root", "Fixture Root", &root, window);
        let tsa_cert = root.certify("Fixture TSA", "Fixture Root", &tsa, window);
        Self {
            root,
            tsa,
            root_cert,
            tsa_cert,
        }
    }

    /// Signer first, root last.
    #[must_use]
    pub fn chain(&self) -> Vec<CertificateV1> {
        vec![self.tsa_cert.clone(), self.root_cert.clone()]
    }

    /// A store trusting exactly the fixture root.
    #[must_use]
    pub fn trust_store(&self) -> TrustStore {
        TrustStore::new(vec![TrustAnchor {
            alias: ROOT_ALIAS.into(),
            certificate: self.root_cert.clone(),
        }])
        .unwrap()
    }

    /// A token over `imprint`, signed by the TSA at `gen_time`.
    #[must_use]
    pub fn timestamp(&self, imprint: &NodeHash, gen_time: i64) -> TimestampTokenV1 {
        self.timestamp_with_chain(imprint, gen_time, self.chain())
    }

    #[must_use]
    pub fn timestamp_with_chain(
        &self,
        imprint: &NodeHash,
        gen_time: i64,
        chain: Vec<CertificateV1>,
    ) -> TimestampTokenV1 {
        let info = token_info(imprint, gen_time);
        let signature = self
            .tsa
            .sign(HashDomain::TokenInfo, &token_info_bytes(&info).unwrap());
        assemble_token(info, self.tsa.algorithm(), signature, chain).unwrap()
    }
}

impl Default for Pki {
    fn default() -> Self {
        Self::new()
    }
}

/// Token info section over `imprint`.
#[must_use]
pub fn token_info(imprint: &NodeHash, gen_time: i64) -> TokenInfoV1 {
    TokenInfoV1 {
        gen_time,
        hash_algorithm: "sha256".into(),
        message_imprint: imprint.to_vec(),
        policy: "1.3.6.1.4.1.0.1".into(),
        serial: "42".into(),
        tsa: "Fixture TSA".into(),
    }
}

/// `count` operations, one minute apart from [`PERIOD_START`].
#[must_use]
pub fn operations(count: usize) -> Vec<OperationRecord> {
    let start: DateTime<Utc> = PERIOD_START.parse().unwrap();
    (0..count)
        .map(|i| OperationRecord {
            id: format!("op-{i:04}"),
            timestamp: start + Duration::minutes(i64::try_from(i).unwrap()),
            event_type: "INGEST".into(),
            payload_hash: payload_hash(&format!("payload-{i}")),
        })
        .collect()
}

/// `ContentHash` of `text`, as producers record payload hashes.
#[must_use]
pub fn payload_hash(text: &str) -> ContentHash {
    let digest: [u8; 32] = Sha256::digest(text.as_bytes()).into();
    ContentHash::from_sha256(&digest)
}

/// Tree over the payload digests of `records`.
#[must_use]
pub fn tree_of(records: &[OperationRecord]) -> MerkleTree {
    let digests: Vec<NodeHash> = records
        .iter()
        .map(|r| r.payload_hash.sha256_bytes().unwrap())
        .collect();
    MerkleTree::from_payload_digests(&digests).unwrap()
}

/// One seal: its log record and the three container members.
#[derive(Debug, Clone)]
pub struct SealParts {
    pub manifest: SealManifest,
    pub operations_json: Vec<u8>,
    pub tree_json: Vec<u8>,
    pub token: Vec<u8>,
}

impl SealParts {
    /// A consistent seal over `records`, timestamped by `pki`.
    #[must_use]
    pub fn build(seal_id: &str, records: &[OperationRecord], pki: &Pki) -> Self {
        let tree = tree_of(records);
        let token = pki.timestamp(&tree.root(), GEN_TIME);
        Self {
            manifest: SealManifest {
                seal_id: seal_id.into(),
                category: TRACEABILITY_CATEGORY.into(),
                period_start: PERIOD_START.parse().unwrap(),
                period_end: PERIOD_END.parse().unwrap(),
                declared_root_hash: tree.root_hash(),
                previous_seal_id: None,
                container_name: format!("{seal_id}.zip"),
                element_count: Some(u64::try_from(records.len()).unwrap()),
            },
            operations_json: operations_to_bytes(records).unwrap(),
            tree_json: tree_to_bytes(&tree).unwrap(),
            token: token_to_bytes(&token).unwrap(),
        }
    }

    /// Replace the token member.
    #[must_use]
    pub fn with_token(mut self, token: &TimestampTokenV1) -> Self {
        self.token = token_to_bytes(token).unwrap();
        self
    }

    /// Edit the serialized tree as JSON and re-encode it.
    #[must_use]
    pub fn with_tree_json(mut self, edit: impl FnOnce(&mut serde_json::Value)) -> Self {
        let mut value: serde_json::Value = serde_json::from_slice(&self.tree_json).unwrap();
        edit(&mut value);
        self.tree_json = serde_json::to_vec(&value).unwrap();
        self
    }

    /// The ZIP container with the three members.
    #[must_use]
    pub fn container(&self) -> Vec<u8> {
        zip_container(&[
            (OPERATIONS_MEMBER, self.operations_json.as_slice()),
            (TREE_MEMBER, self.tree_json.as_slice()),
            (TOKEN_MEMBER, self.token.as_slice()),
        ])
    }
}

/// Deflated ZIP archive of `members`, in order.
#[must_use]
pub fn zip_container(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());
    for (name, bytes) in members {
        writer.start_file(*name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Orchestrator over in-memory stores.
pub type MemoryOrchestrator =
    SealVerificationOrchestrator<MemoryLogStore, MemoryObjectStore, StaticTrustStore>;

/// An orchestrator serving `records` and `objects`, staging under
/// `staging_root`.
#[must_use]
pub fn orchestrator(
    staging_root: &Path,
    records: Vec<SealManifest>,
    objects: MemoryObjectStore,
    trust: StaticTrustStore,
) -> MemoryOrchestrator {
    let config = VerifyConfig {
        staging_root: staging_root.to_path_buf(),
        ..VerifyConfig::default()
    };
    SealVerificationOrchestrator::new(&config, MemoryLogStore::new(records), objects, trust)
}

/// Verify `parts` end to end with `trust` as the trust store.
#[must_use]
pub fn run(parts: &SealParts, trust: TrustStore, staging_root: &Path) -> VerificationOutcome {
    let objects =
        MemoryObjectStore::new().with_object(parts.manifest.container_name.clone(), parts.container());
    let orch = orchestrator(
        staging_root,
        vec![parts.manifest.clone()],
        objects,
        StaticTrustStore::new(trust),
    );
    orch.verify(&context("lock"), &parts.manifest.seal_id)
}

/// Context for tenant 1.
#[must_use]
pub fn context(request_id: &str) -> VerificationContext {
    VerificationContext::new(1, request_id).unwrap()
}

/// Orchestrator over the filesystem stores.
pub type DirOrchestrator =
    SealVerificationOrchestrator<DirLogStore, DirObjectStore, FileTrustStoreLoader>;

/// Offline store layout under one directory, as `seal-verify` reads it.
#[derive(Debug, Clone)]
pub struct OfflineLayout {
    pub log_dir: PathBuf,
    pub object_dir: PathBuf,
    pub trust_store_path: PathBuf,
    pub staging_root: PathBuf,
}

impl OfflineLayout {
    #[must_use]
    pub fn under(dir: &Path) -> Self {
        Self {
            log_dir: dir.join("log"),
            object_dir: dir.join("objects"),
            trust_store_path: dir.join("trust_store.json"),
            staging_root: dir.join("staging"),
        }
    }

    /// Write the log records and containers of `seals`, and `trust`.
    ///
    /// # Errors
    ///
    /// Returns [`FsStoreWriteError`] if any store write fails.
    pub fn write(&self, seals: &[SealParts], trust: &TrustStore) -> Result<(), FsStoreWriteError> {
        let manifests: Vec<SealManifest> = seals.iter().map(|s| s.manifest.clone()).collect();
        DirLogStore::new(&self.log_dir).write_records(&manifests)?;
        let objects = DirObjectStore::new(&self.object_dir);
        for seal in seals {
            objects.put(&seal.manifest.container_name, &seal.container())?;
        }
        FileTrustStoreLoader::new(&self.trust_store_path).write(trust)
    }

    #[must_use]
    pub fn config(&self) -> VerifyConfig {
        VerifyConfig {
            staging_root: self.staging_root.clone(),
            trust_store_path: self.trust_store_path.clone(),
            log_store_dir: self.log_dir.clone(),
            object_store_dir: self.object_dir.clone(),
            ..VerifyConfig::default()
        }
    }

    #[must_use]
    pub fn orchestrator(&self) -> DirOrchestrator {
        SealVerificationOrchestrator::new(
            &self.config(),
            DirLogStore::new(&self.log_dir),
            DirObjectStore::new(&self.object_dir),
            FileTrustStoreLoader::new(&self.trust_store_path),
        )
    }
}
