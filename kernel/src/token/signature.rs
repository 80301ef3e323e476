//! Signature verification for tokens and certificates.
//!
//! Every signature covers `domain || section` where `section` is the exact
//! canonical byte string carried on the wire. Verification returns
//! `Ok(false)` for a well-formed signature that does not verify, and an error
//! only when the key or signature cannot be decoded.

use ed25519_dalek::Verifier as _;

use crate::proof::hash::HashDomain;
use crate::token::types::SignatureAlgorithm;

/// Errors from decoding keys or signatures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid {algorithm} public key: {detail}")]
    InvalidPublicKey {
        algorithm: SignatureAlgorithm,
        detail: String,
    },
    #[error("invalid {algorithm} signature: {detail}")]
    InvalidSignature {
        algorithm: SignatureAlgorithm,
        detail: String,
    },
}

/// The message actually signed for a section: `domain || section`.
#[must_use]
pub fn signing_input(domain: HashDomain, section: &[u8]) -> Vec<u8> {
    let prefix = domain.as_bytes();
    let mut out = Vec::with_capacity(prefix.len() + section.len());
    out.extend_from_slice(prefix);
    out.extend_from_slice(section);
    out
}

/// Verify `signature` over `message` with `public_key`.
///
/// # Errors
///
/// Returns [`SignatureError`] if the key or the signature is malformed.
pub fn verify_signature(
    algorithm: SignatureAlgorithm,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<bool, SignatureError> {
    match algorithm {
        SignatureAlgorithm::Ed25519 => verify_ed25519(public_key, message, signature),
        SignatureAlgorithm::EcdsaP256 => verify_p256(public_key, message, signature),
    }
}

/// Check that `public_key` decodes as an `algorithm` key.
///
/// # Errors
///
/// Returns [`SignatureError::InvalidPublicKey`] if it does not.
pub fn check_public_key(
    algorithm: SignatureAlgorithm,
    public_key: &[u8],
) -> Result<(), SignatureError> {
    match algorithm {
        SignatureAlgorithm::Ed25519 => decode_ed25519_key(public_key).map(drop),
        SignatureAlgorithm::EcdsaP256 => decode_p256_key(public_key).map(drop),
    }
}

fn decode_ed25519_key(public_key: &[u8]) -> Result<ed25519_dalek::VerifyingKey, SignatureError> {
    let algorithm = SignatureAlgorithm::Ed25519;
    let pk: [u8; 32] = public_key
        .try_into()
        .map_err(|_| SignatureError::InvalidPublicKey {
            algorithm,
            detail: format!("must be 32 bytes, got {}", public_key.len()),
        })?;
    ed25519_dalek::VerifyingKey::from_bytes(&pk).map_err(|e| SignatureError::InvalidPublicKey {
        algorithm,
        detail: e.to_string(),
    })
}

fn decode_p256_key(public_key: &[u8]) -> Result<p256::ecdsa::VerifyingKey, SignatureError> {
    p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key).map_err(|e| {
        SignatureError::InvalidPublicKey {
            algorithm: SignatureAlgorithm::EcdsaP256,
            detail: e.to_string(),
        }
    })
}

fn verify_ed25519(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, SignatureError> {
    let vk = decode_ed25519_key(public_key)?;
    let sig = ed25519_dalek::Signature::from_slice(signature).map_err(|e| {
        SignatureError::InvalidSignature {
            algorithm: SignatureAlgorithm::Ed25519,
            detail: e.to_string(),
        }
    })?;
    Ok(vk.verify(message, &sig).is_ok())
}

fn verify_p256(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, SignatureError> {
    let vk = decode_p256_key(public_key)?;
    let sig = p256::ecdsa::Signature::from_slice(signature).map_err(|e| {
        SignatureError::InvalidSignature {
            algorithm: SignatureAlgorithm::EcdsaP256,
            detail: e.to_string(),
        }
    })?;
    Ok(vk.verify(message, &sig).is_ok())
}
