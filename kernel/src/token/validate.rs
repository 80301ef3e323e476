//! Token binding and trust validation.
//!
//! [`compare_imprint`] checks that a token timestamps a given root.
//! [`validate_token`] checks who signed it, in this order:
//!
//! 1. the token signature verifies under `chain[0]`, the signer;
//! 2. each `chain[i]` names `chain[i + 1]` as issuer and verifies under it;
//! 3. the signing time lies inside every chain certificate's validity window;
//! 4. exactly one trust anchor matches the top of the chain.
//!
//! An anchor matches the top certificate when their fingerprints are equal,
//! or when the anchor's subject is the top's issuer and the anchor's key
//! verifies the top's signature.

use crate::proof::hash::{constant_time_eq, HashDomain, SHA256_ALGORITHM, SHA256_LEN};
use crate::token::signature::{signing_input, verify_signature, SignatureError};
use crate::token::trust_store::TrustStore;
use crate::token::types::{CertificateV1, SignatureAlgorithm, TimestampTokenV1};

/// Why a token does not timestamp the expected root.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImprintMismatch {
    #[error("token imprint uses {found}, expected sha256")]
    HashAlgorithm { found: String },
    #[error("token imprint {found} does not match root {expected}")]
    Digest { expected: String, found: String },
}

/// Why a token's signer is not trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrustFailure {
    #[error("token carries no signer certificate")]
    NoSigner,
    #[error("token signed with {signed_with} but signer key is {key_algorithm}")]
    AlgorithmMismatch {
        signed_with: SignatureAlgorithm,
        key_algorithm: SignatureAlgorithm,
    },
    #[error("token signature does not verify under the signer key")]
    BadTokenSignature,
    #[error("certificate {index} names issuer {issuer} but chain continues with {next_subject}")]
    IssuerMismatch {
        index: usize,
        issuer: String,
        next_subject: String,
    },
    #[error("certificate {index} signature does not verify under its issuer")]
    BadChainSignature { index: usize },
    #[error(
        "signing time {gen_time} outside certificate {index} validity [{not_before}, {not_after}]"
    )]
    CertificateNotValidAt {
        index: usize,
        gen_time: i64,
        not_before: i64,
        not_after: i64,
    },
    #[error("no trust anchor matches the signer chain")]
    Untrusted,
    #[error("signer chain matches several trust anchors: {}", .aliases.join(", "))]
    Ambiguous { aliases: Vec<String> },
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

/// Check that `token` timestamps `root`.
///
/// # Errors
///
/// Returns [`ImprintMismatch`] if the imprint algorithm is not SHA-256 or the
/// imprint differs from `root`.
pub fn compare_imprint(
    token: &TimestampTokenV1,
    root: &[u8; SHA256_LEN],
) -> Result<(), ImprintMismatch> {
    let info = token.info();
    if info.hash_algorithm != SHA256_ALGORITHM {
        return Err(ImprintMismatch::HashAlgorithm {
            found: info.hash_algorithm.clone(),
        });
    }
    if !constant_time_eq(&info.message_imprint, root) {
        return Err(ImprintMismatch::Digest {
            expected: hex::encode(root),
            found: hex::encode(&info.message_imprint),
        });
    }
    Ok(())
}

/// Validate the token signature and signer chain against `store`.
///
/// Returns the alias of the single matching anchor.
///
/// # Errors
///
/// Returns the first [`TrustFailure`] in validation order.
pub fn validate_token(token: &TimestampTokenV1, store: &TrustStore) -> Result<String, TrustFailure> {
    let signer = token.signer().ok_or(TrustFailure::NoSigner)?;

    if token.signature_algorithm() != signer.tbs().key_algorithm {
        return Err(TrustFailure::AlgorithmMismatch {
            signed_with: token.signature_algorithm(),
            key_algorithm: signer.tbs().key_algorithm,
        });
    }
    if !verify_issued_by(
        token.signature_algorithm(),
        token.signature(),
        HashDomain::TokenInfo,
        token.info_bytes(),
        signer,
    )? {
        return Err(TrustFailure::BadTokenSignature);
    }

    for (index, pair) in token.chain().windows(2).enumerate() {
        let (cert, issuer) = (&pair[0], &pair[1]);
        if cert.tbs().issuer != issuer.tbs().subject {
            return Err(TrustFailure::IssuerMismatch {
                index,
                issuer: cert.tbs().issuer.clone(),
                next_subject: issuer.tbs().subject.clone(),
            });
        }
        if !certificate_verifies_under(cert, issuer)? {
            return Err(TrustFailure::BadChainSignature { index });
        }
    }

    let gen_time = token.info().gen_time;
    if let Some((index, cert)) = token
        .chain()
        .iter()
        .enumerate()
        .find(|(_, cert)| !cert.tbs().is_valid_at(gen_time))
    {
        return Err(TrustFailure::CertificateNotValidAt {
            index,
            gen_time,
            not_before: cert.tbs().not_before,
            not_after: cert.tbs().not_after,
        });
    }

    let top = token.chain().last().ok_or(TrustFailure::NoSigner)?;
    let mut matched = Vec::new();
    for anchor in store.anchors() {
        if anchor_matches(&anchor.certificate, top)? {
            matched.push(anchor.alias.clone());
        }
    }
    match matched.len() {
        0 => Err(TrustFailure::Untrusted),
        1 => Ok(matched.remove(0)),
        _ => Err(TrustFailure::Ambiguous { aliases: matched }),
    }
}

fn anchor_matches(anchor: &CertificateV1, top: &CertificateV1) -> Result<bool, TrustFailure> {
    if constant_time_eq(&anchor.fingerprint(), &top.fingerprint()) {
        return Ok(true);
    }
    if anchor.tbs().subject != top.tbs().issuer {
        return Ok(false);
    }
    certificate_verifies_under(top, anchor)
}

fn certificate_verifies_under(
    cert: &CertificateV1,
    issuer: &CertificateV1,
) -> Result<bool, TrustFailure> {
    verify_issued_by(
        cert.signature_algorithm(),
        cert.signature(),
        HashDomain::CertificateTbs,
        cert.tbs_bytes(),
        issuer,
    )
}

/// Whether `signature` over `domain || section` verifies under `key_holder`.
/// A signature algorithm that differs from the holder's key algorithm never
/// verifies.
fn verify_issued_by(
    signed_with: SignatureAlgorithm,
    signature: &[u8],
    domain: HashDomain,
    section: &[u8],
    key_holder: &CertificateV1,
) -> Result<bool, TrustFailure> {
    let key_algorithm = key_holder.tbs().key_algorithm;
    if signed_with != key_algorithm {
        return Ok(false);
    }
    verify_signature(
        key_algorithm,
        &key_holder.tbs().public_key,
        &signing_input(domain, section),
        signature,
    )
    .map_err(TrustFailure::from)
}
