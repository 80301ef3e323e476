//! Canonical JSON bytes for every signed or hashed seal section.
//!
//! Token info, certificate TBS sections and the staged-artifact digests are
//! all produced here. A signature over JSON is only meaningful if exactly one
//! byte string represents a given value, so readers re-canonicalize what they
//! parse and refuse anything that differs.
//!
//! # Canonicalization rules
//!
//! 1. Object keys are sorted lexicographically (byte order).
//! 2. No whitespace (`{"a":1,"b":2}`).
//! 3. Strings are JSON-escaped per RFC 8259 §7.
//! 4. Numbers must be integers (`i64` or `u64`). Floats are rejected.
//! 5. `null`, `true`, `false` are written literally.

use std::io::Write;

use serde::Serialize;

/// Error type for canonical JSON serialization and verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanonError {
    /// A JSON number was not an integer.
    #[error("non-integer number in canonical JSON: {raw}")]
    NonIntegerNumber { raw: String },
    /// The input was not JSON, or a value refused to serialize.
    #[error("invalid JSON: {detail}")]
    InvalidJson { detail: String },
    /// The input parsed but is not in canonical form.
    #[error("JSON section is not canonical")]
    NotCanonical,
}

/// Produce canonical JSON bytes from a `serde_json::Value`.
///
/// # Errors
///
/// Returns [`CanonError::NonIntegerNumber`] if any JSON number is not
/// representable as `i64` or `u64`.
pub fn canonical_json_bytes(value: &serde_json::Value) -> Result<Vec<u8>, CanonError> {
    let mut buf = Vec::new();
    write_value(&mut buf, value)?;
    Ok(buf)
}

/// Serialize any `Serialize` value straight to canonical bytes.
///
/// # Errors
///
/// Returns [`CanonError`] if the value does not serialize to JSON or
/// contains a non-integer number.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CanonError> {
    let value = serde_json::to_value(value).map_err(|e| CanonError::InvalidJson {
        detail: e.to_string(),
    })?;
    canonical_json_bytes(&value)
}

/// Parse `bytes` as JSON and require that they are already canonical.
///
/// Returns the parsed value so callers decode once.
///
/// # Errors
///
/// Returns [`CanonError::InvalidJson`] for malformed input and
/// [`CanonError::NotCanonical`] when re-canonicalization changes the bytes.
pub fn verify_canonical(bytes: &[u8]) -> Result<serde_json::Value, CanonError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| CanonError::InvalidJson {
            detail: e.to_string(),
        })?;
    if canonical_json_bytes(&value)? != bytes {
        return Err(CanonError::NotCanonical);
    }
    Ok(value)
}

fn write_value(buf: &mut Vec<u8>, value: &serde_json::Value) -> Result<(), CanonError> {
    match value {
        serde_json::Value::Null => buf.extend_from_slice(b"null"),
        serde_json::Value::Bool(true) => buf.extend_from_slice(b"true"),
        serde_json::Value::Bool(false) => buf.extend_from_slice(b"false"),
        serde_json::Value::Number(n) => write_number(buf, n)?,
        serde_json::Value::String(s) => write_string(buf, s),
        serde_json::Value::Array(arr) => {
            buf.push(b'[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_value(buf, item)?;
            }
            buf.push(b']');
        }
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(&String, &serde_json::Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            buf.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_string(buf, key);
                buf.push(b':');
                write_value(buf, item)?;
            }
            buf.push(b'}');
        }
    }
    Ok(())
}

fn write_number(buf: &mut Vec<u8>, n: &serde_json::Number) -> Result<(), CanonError> {
    if let Some(i) = n.as_i64() {
        let _ = write!(buf, "{i}");
        Ok(())
    } else if let Some(u) = n.as_u64() {
        let _ = write!(buf, "{u}");
        Ok(())
    } else {
        Err(CanonError::NonIntegerNumber { raw: n.to_string() })
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            c if c < '\u{0020}' => {
                let _ = write!(buf, "\\u{:04x}", c as u32);
            }
            c => {
                let mut utf8 = [0u8; 4];
                buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
    buf.push(b'"');
}
