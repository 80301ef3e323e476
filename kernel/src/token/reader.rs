//! `TST1` token reader: decodes token bytes into [`TimestampTokenV1`].
//!
//! Fail-closed: rejects truncated input, bad magic, oversize sections,
//! non-canonical JSON, unknown algorithm tags, wrong signature lengths, an
//! empty or oversize chain, and trailing bytes. No panics on malformed input;
//! every failure is a typed error.

use serde::de::DeserializeOwned;

use crate::proof::canon::verify_canonical;
use crate::token::types::{
    CertificateParseError, CertificateV1, SignatureAlgorithm, TimestampTokenV1, TokenParseError,
    MAX_CERT_LEN, MAX_CHAIN_LEN, MAX_INFO_LEN, TOKEN_V1_MAGIC,
};

/// Parse token bytes.
///
/// # Errors
///
/// Returns [`TokenParseError`] for any structural defect.
pub fn bytes_to_token(data: &[u8]) -> Result<TimestampTokenV1, TokenParseError> {
    let mut cursor = Cursor::new(data);

    // --- Magic ---
    let magic_bytes = cursor.take(4, "magic")?;
    let mut magic = [0u8; 4];
    magic.copy_from_slice(magic_bytes);
    if magic != TOKEN_V1_MAGIC {
        return Err(TokenParseError::BadMagic { found: magic });
    }

    // --- Info ---
    let info_len = cursor.u32le("info")?;
    if info_len > MAX_INFO_LEN {
        return Err(TokenParseError::SectionTooLong {
            section: "info".into(),
            len: info_len,
        });
    }
    let info_bytes = cursor.take(info_len, "info")?;
    let info = decode_canonical(info_bytes).map_err(|e| match e {
        SectionError::NotCanonical(detail) => TokenParseError::NotCanonical { detail },
        SectionError::Invalid(detail) => TokenParseError::InvalidInfo { detail },
    })?;

    // --- Signature ---
    let (signature_algorithm, signature) = read_signature(&mut cursor, "token signature")
        .map_err(|e| match e {
            SignatureFieldError::Truncated(t) => t.into(),
            SignatureFieldError::UnknownTag(tag) => {
                TokenParseError::UnknownSignatureAlgorithm { tag }
            }
            SignatureFieldError::BadLength {
                algorithm,
                expected,
                actual,
            } => TokenParseError::BadSignatureLength {
                algorithm,
                expected,
                actual,
            },
        })?;

    // --- Chain ---
    let count = usize::from(cursor.u8("cert_count")?);
    if count == 0 {
        return Err(TokenParseError::EmptyChain);
    }
    if count > MAX_CHAIN_LEN {
        return Err(TokenParseError::ChainTooLong { count });
    }
    let mut chain = Vec::with_capacity(count);
    for index in 0..count {
        let section = format!("certificate {index}");
        let cert_len = cursor.u32le(&section)?;
        if cert_len > MAX_CERT_LEN {
            return Err(TokenParseError::SectionTooLong {
                section,
                len: cert_len,
            });
        }
        let cert_bytes = cursor.take(cert_len, &section)?;
        let cert = bytes_to_certificate(cert_bytes)
            .map_err(|source| TokenParseError::InvalidCertificate { index, source })?;
        chain.push(cert);
    }

    let trailing = cursor.remaining();
    if trailing != 0 {
        return Err(TokenParseError::TrailingBytes { count: trailing });
    }

    Ok(TimestampTokenV1 {
        info,
        info_bytes: info_bytes.to_vec(),
        signature_algorithm,
        signature,
        chain,
    })
}

/// Parse one certificate encoding.
///
/// # Errors
///
/// Returns [`CertificateParseError`] for any structural defect, including
/// bytes left over after the signature.
pub fn bytes_to_certificate(data: &[u8]) -> Result<CertificateV1, CertificateParseError> {
    let mut cursor = Cursor::new(data);

    let tbs_len = cursor.u16le("tbs")?;
    let tbs_bytes = cursor.take(tbs_len, "tbs")?;
    let tbs = decode_canonical(tbs_bytes).map_err(|e| match e {
        SectionError::NotCanonical(detail) => CertificateParseError::NotCanonical { detail },
        SectionError::Invalid(detail) => CertificateParseError::InvalidTbs { detail },
    })?;

    let (signature_algorithm, signature) =
        read_signature(&mut cursor, "certificate signature").map_err(|e| match e {
            SignatureFieldError::Truncated(t) => t.into(),
            SignatureFieldError::UnknownTag(tag) => {
                CertificateParseError::UnknownSignatureAlgorithm { tag }
            }
            SignatureFieldError::BadLength {
                algorithm,
                expected,
                actual,
            } => CertificateParseError::BadSignatureLength {
                algorithm,
                expected,
                actual,
            },
        })?;

    let trailing = cursor.remaining();
    if trailing != 0 {
        return Err(CertificateParseError::TrailingBytes { count: trailing });
    }

    Ok(CertificateV1 {
        tbs,
        tbs_bytes: tbs_bytes.to_vec(),
        signature_algorithm,
        signature,
        encoded: data.to_vec(),
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Length prefix or slice ran past the end of the input.
struct Truncated(String);

impl From<Truncated> for TokenParseError {
    fn from(t: Truncated) -> Self {
        Self::Truncated { detail: t.0 }
    }
}

impl From<Truncated> for CertificateParseError {
    fn from(t: Truncated) -> Self {
        Self::Truncated { detail: t.0 }
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize, section: &str) -> Result<&'a [u8], Truncated> {
        if len > self.remaining() {
            return Err(Truncated(format!(
                "{section}: need {len} bytes at offset {} but only {} remain",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self, section: &str) -> Result<u8, Truncated> {
        Ok(self.take(1, section)?[0])
    }

    fn u16le(&mut self, section: &str) -> Result<usize, Truncated> {
        let b = self.take(2, section)?;
        Ok(usize::from(u16::from_le_bytes([b[0], b[1]])))
    }

    fn u32le(&mut self, section: &str) -> Result<usize, Truncated> {
        let b = self.take(4, section)?;
        usize::try_from(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .map_err(|_| Truncated(format!("{section}: length does not fit in usize")))
    }
}

enum SignatureFieldError {
    Truncated(Truncated),
    UnknownTag(u8),
    BadLength {
        algorithm: SignatureAlgorithm,
        expected: usize,
        actual: usize,
    },
}

impl From<Truncated> for SignatureFieldError {
    fn from(t: Truncated) -> Self {
        Self::Truncated(t)
    }
}

fn read_signature(
    cursor: &mut Cursor<'_>,
    section: &str,
) -> Result<(SignatureAlgorithm, Vec<u8>), SignatureFieldError> {
    let tag = cursor.u8(section)?;
    let algorithm =
        SignatureAlgorithm::from_byte(tag).ok_or(SignatureFieldError::UnknownTag(tag))?;
    let len = cursor.u16le(section)?;
    let expected = algorithm.signature_len();
    if len != expected {
        return Err(SignatureFieldError::BadLength {
            algorithm,
            expected,
            actual: len,
        });
    }
    Ok((algorithm, cursor.take(len, section)?.to_vec()))
}

enum SectionError {
    NotCanonical(String),
    Invalid(String),
}

fn decode_canonical<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SectionError> {
    let value = verify_canonical(bytes).map_err(|e| SectionError::NotCanonical(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| SectionError::Invalid(e.to_string()))
}
