//! `TST1` token writer: assembles tokens and certificates from signed parts.
//!
//! Signing happens outside the kernel. Callers canonicalize a section with
//! [`token_info_bytes`] or [`certificate_tbs_bytes`], sign
//! [`super::signature::signing_input`] over it, and hand the signature back
//! here.

use crate::proof::canon::{to_canonical_bytes, CanonError};
use crate::token::types::{
    CertificateTbsV1, CertificateV1, SignatureAlgorithm, TimestampTokenV1, TokenInfoV1,
    MAX_CERT_LEN, MAX_CHAIN_LEN, MAX_INFO_LEN, TOKEN_V1_MAGIC,
};

/// Errors from assembling or encoding tokens and certificates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenEncodeError {
    #[error(transparent)]
    Canon(#[from] CanonError),
    #[error("{section} section too long: {len} bytes")]
    SectionTooLong { section: String, len: usize },
    #[error("{algorithm} signature must be {expected} bytes, got {actual}")]
    BadSignatureLength {
        algorithm: SignatureAlgorithm,
        expected: usize,
        actual: usize,
    },
    #[error("a token needs between 1 and {MAX_CHAIN_LEN} certificates, got {count}")]
    ChainLength { count: usize },
}

/// Canonical bytes of a token info section.
///
/// # Errors
///
/// Returns [`CanonError`] if the section does not serialize.
pub fn token_info_bytes(info: &TokenInfoV1) -> Result<Vec<u8>, CanonError> {
    to_canonical_bytes(info)
}

/// Canonical bytes of a certificate TBS section.
///
/// # Errors
///
/// Returns [`CanonError`] if the section does not serialize.
pub fn certificate_tbs_bytes(tbs: &CertificateTbsV1) -> Result<Vec<u8>, CanonError> {
    to_canonical_bytes(tbs)
}

/// Build a certificate from its TBS section and the issuer's signature.
///
/// # Errors
///
/// Returns [`TokenEncodeError`] if the TBS section or the full encoding
/// exceeds its length limit, or the signature length is wrong.
pub fn assemble_certificate(
    tbs: CertificateTbsV1,
    signature_algorithm: SignatureAlgorithm,
    signature: Vec<u8>,
) -> Result<CertificateV1, TokenEncodeError> {
    check_signature_len(signature_algorithm, &signature)?;
    let tbs_bytes = certificate_tbs_bytes(&tbs)?;
    let tbs_len = u16::try_from(tbs_bytes.len()).map_err(|_| TokenEncodeError::SectionTooLong {
        section: "tbs".into(),
        len: tbs_bytes.len(),
    })?;

    let mut encoded = Vec::with_capacity(2 + tbs_bytes.len() + 3 + signature.len());
    encoded.extend_from_slice(&tbs_len.to_le_bytes());
    encoded.extend_from_slice(&tbs_bytes);
    write_signature(&mut encoded, signature_algorithm, &signature);
    if encoded.len() > MAX_CERT_LEN {
        return Err(TokenEncodeError::SectionTooLong {
            section: "certificate".into(),
            len: encoded.len(),
        });
    }

    Ok(CertificateV1 {
        tbs,
        tbs_bytes,
        signature_algorithm,
        signature,
        encoded,
    })
}

/// Build a token from its info section, the signer's signature, and the
/// signer chain (signer first).
///
/// # Errors
///
/// Returns [`TokenEncodeError`] if the info section is too long, the
/// signature length is wrong, or the chain is empty or too long.
pub fn assemble_token(
    info: TokenInfoV1,
    signature_algorithm: SignatureAlgorithm,
    signature: Vec<u8>,
    chain: Vec<CertificateV1>,
) -> Result<TimestampTokenV1, TokenEncodeError> {
    check_signature_len(signature_algorithm, &signature)?;
    if chain.is_empty() || chain.len() > MAX_CHAIN_LEN {
        return Err(TokenEncodeError::ChainLength { count: chain.len() });
    }
    let info_bytes = token_info_bytes(&info)?;
    if info_bytes.len() > MAX_INFO_LEN {
        return Err(TokenEncodeError::SectionTooLong {
            section: "info".into(),
            len: info_bytes.len(),
        });
    }
    Ok(TimestampTokenV1 {
        info,
        info_bytes,
        signature_algorithm,
        signature,
        chain,
    })
}

/// Encode a token.
///
/// # Errors
///
/// Returns [`TokenEncodeError`] if a length does not fit its prefix.
pub fn token_to_bytes(token: &TimestampTokenV1) -> Result<Vec<u8>, TokenEncodeError> {
    let mut out = Vec::new();
    out.extend_from_slice(&TOKEN_V1_MAGIC);
    write_u32_section(&mut out, "info", token.info_bytes())?;
    write_signature(&mut out, token.signature_algorithm(), token.signature());

    let count = u8::try_from(token.chain().len()).map_err(|_| TokenEncodeError::ChainLength {
        count: token.chain().len(),
    })?;
    out.push(count);
    for cert in token.chain() {
        write_u32_section(&mut out, "certificate", cert.encoded())?;
    }
    Ok(out)
}

fn check_signature_len(
    algorithm: SignatureAlgorithm,
    signature: &[u8],
) -> Result<(), TokenEncodeError> {
    if signature.len() == algorithm.signature_len() {
        Ok(())
    } else {
        Err(TokenEncodeError::BadSignatureLength {
            algorithm,
            expected: algorithm.signature_len(),
            actual: signature.len(),
        })
    }
}

// Signature lengths are fixed at 64 by `check_signature_len`, so the u16
// prefix cannot overflow.
fn write_signature(out: &mut Vec<u8>, algorithm: SignatureAlgorithm, signature: &[u8]) {
    out.push(algorithm.as_byte());
    let len = u16::try_from(signature.len()).unwrap_or(u16::MAX);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(signature);
}

fn write_u32_section(out: &mut Vec<u8>, section: &str, bytes: &[u8]) -> Result<(), TokenEncodeError> {
    let len = u32::try_from(bytes.len()).map_err(|_| TokenEncodeError::SectionTooLong {
        section: section.into(),
        len: bytes.len(),
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}
