//! Filesystem collaborators for offline verification.
//!
//! # Directory layout
//!
//! ```text
//! <log_dir>/seal_log.jsonl      # one SealManifest JSON object per line
//! <object_dir>/<name>           # one file per stored object
//! <trust_store_path>            # trust_store.v1 JSON document
//! ```
//!
//! Object names are plain file names. A name with a path separator or a
//! `.`/`..` component is refused rather than resolved.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use seal_kernel::seal::manifest::SealManifest;
use seal_kernel::token::trust_store::{parse_trust_store, TrustStore};

use crate::context::VerificationContext;
use crate::store::{
    LogStore, LogStoreError, ObjectStore, ObjectStoreError, TrustStoreLoadError, TrustStoreLoader,
};

/// File name of the seal log inside a log directory.
pub const SEAL_LOG_FILENAME: &str = "seal_log.jsonl";

/// Error writing filesystem stores.
#[derive(Debug, thiserror::Error)]
pub enum FsStoreWriteError {
    #[error("I/O error: {detail}")]
    Io { detail: String },
    #[error("invalid object name {name:?}")]
    InvalidName { name: String },
    #[error("serialization failed: {detail}")]
    Serialize { detail: String },
}

/// Seal log stored as JSON lines.
#[derive(Debug, Clone)]
pub struct DirLogStore {
    dir: PathBuf,
}

impl DirLogStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Replace the seal log with `records`.
    ///
    /// # Errors
    ///
    /// Returns [`FsStoreWriteError`] on I/O or serialization failure.
    pub fn write_records(&self, records: &[SealManifest]) -> Result<(), FsStoreWriteError> {
        let mut out = Vec::new();
        for record in records {
            serde_json::to_writer(&mut out, record).map_err(|e| FsStoreWriteError::Serialize {
                detail: e.to_string(),
            })?;
            out.push(b'\n');
        }
        create_dir(&self.dir)?;
        write_atomic(&self.dir.join(SEAL_LOG_FILENAME), &out)
    }
}

impl LogStore for DirLogStore {
    fn seal_records(
        &self,
        _ctx: &VerificationContext,
        seal_id: &str,
    ) -> Result<Vec<SealManifest>, LogStoreError> {
        let path = self.dir.join(SEAL_LOG_FILENAME);
        let text = std::fs::read_to_string(&path).map_err(|e| LogStoreError::Unavailable {
            detail: format!("read {}: {e}", path.display()),
        })?;

        let mut matches = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: SealManifest =
                serde_json::from_str(line).map_err(|e| LogStoreError::Corrupt {
                    detail: format!("{}:{}: {e}", path.display(), index + 1),
                })?;
            if record.seal_id == seal_id {
                matches.push(record);
            }
        }
        Ok(matches)
    }
}

/// Object store over a flat directory.
#[derive(Debug, Clone)]
pub struct DirObjectStore {
    dir: PathBuf,
}

impl DirObjectStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store `bytes` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FsStoreWriteError`] for an invalid name or I/O failure.
    pub fn put(&self, name: &str, bytes: &[u8]) -> Result<(), FsStoreWriteError> {
        if !is_plain_file_name(name) {
            return Err(FsStoreWriteError::InvalidName { name: name.into() });
        }
        create_dir(&self.dir)?;
        write_atomic(&self.dir.join(name), bytes)
    }
}

impl ObjectStore for DirObjectStore {
    fn fetch_container(
        &self,
        _ctx: &VerificationContext,
        name: &str,
    ) -> Result<Vec<u8>, ObjectStoreError> {
        if !is_plain_file_name(name) {
            return Err(ObjectStoreError::NotFound { name: name.into() });
        }
        let path = self.dir.join(name);
        std::fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ObjectStoreError::NotFound { name: name.into() },
            _ => ObjectStoreError::Io {
                detail: format!("read {}: {e}", path.display()),
            },
        })
    }
}

/// Trust store read from a JSON file on every load.
#[derive(Debug, Clone)]
pub struct FileTrustStoreLoader {
    path: PathBuf,
}

impl FileTrustStoreLoader {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write `store` to the loader's path.
    ///
    /// # Errors
    ///
    /// Returns [`FsStoreWriteError`] on I/O or serialization failure.
    pub fn write(&self, store: &TrustStore) -> Result<(), FsStoreWriteError> {
        let bytes = seal_kernel::token::trust_store::trust_store_to_bytes(store).map_err(|e| {
            FsStoreWriteError::Serialize {
                detail: e.to_string(),
            }
        })?;
        if let Some(parent) = self.path.parent() {
            create_dir(parent)?;
        }
        write_atomic(&self.path, &bytes)
    }
}

impl TrustStoreLoader for FileTrustStoreLoader {
    fn load_trust_anchors(
        &self,
        _ctx: &VerificationContext,
    ) -> Result<TrustStore, TrustStoreLoadError> {
        let bytes = std::fs::read(&self.path).map_err(|e| TrustStoreLoadError::Io {
            detail: format!("read {}: {e}", self.path.display()),
        })?;
        Ok(parse_trust_store(&bytes)?)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some_and(|f| f == name)
}

fn create_dir(dir: &Path) -> Result<(), FsStoreWriteError> {
    std::fs::create_dir_all(dir).map_err(|e| FsStoreWriteError::Io {
        detail: format!("create_dir_all {}: {e}", dir.display()),
    })
}

/// Write to a temp file in the same directory, then rename over `path`.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), FsStoreWriteError> {
    let dir = path.parent().ok_or_else(|| FsStoreWriteError::Io {
        detail: "no parent directory".into(),
    })?;
    let temp_path = dir.join(format!(
        ".tmp_{}",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));
    std::fs::write(&temp_path, content).map_err(|e| FsStoreWriteError::Io {
        detail: format!("write {}: {e}", temp_path.display()),
    })?;
    std::fs::rename(&temp_path, path).map_err(|e| FsStoreWriteError::Io {
        detail: format!("rename {} → {}: {e}", temp_path.display(), path.display()),
    })
}
