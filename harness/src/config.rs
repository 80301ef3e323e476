//! `VerifyConfig`: verifier settings, loaded from JSON.
//!
//! Every field has a default, so `{}` is a valid config file. Unknown keys
//! are rejected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use seal_kernel::seal::manifest::TRACEABILITY_CATEGORY;

/// Default per-member cap when extracting containers: 256 MiB.
pub const DEFAULT_MAX_MEMBER_BYTES: u64 = 256 * 1024 * 1024;

/// Error loading or validating a [`VerifyConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {detail}")]
    Io { path: String, detail: String },
    #[error("invalid config {path}: {detail}")]
    Parse { path: String, detail: String },
    #[error("invalid config value: {detail}")]
    Invalid { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    /// Parent of the per-job staging directories.
    pub staging_root: PathBuf,
    pub trust_store_path: PathBuf,
    /// Directory holding the seal log.
    pub log_store_dir: PathBuf,
    /// Directory holding seal containers.
    pub object_store_dir: PathBuf,
    pub expected_category: String,
    pub max_member_bytes: u64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            staging_root: PathBuf::from("staging"),
            trust_store_path: PathBuf::from("trust_store.json"),
            log_store_dir: PathBuf::from("log"),
            object_store_dir: PathBuf::from("objects"),
            expected_category: TRACEABILITY_CATEGORY.into(),
            max_member_bytes: DEFAULT_MAX_MEMBER_BYTES,
        }
    }
}

impl VerifyConfig {
    /// Read and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is not a valid
    /// config document, or fails [`VerifyConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no job could run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty category or a zero
    /// member cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expected_category.is_empty() {
            return Err(ConfigError::Invalid {
                detail: "expected_category is empty".into(),
            });
        }
        if self.max_member_bytes == 0 {
            return Err(ConfigError::Invalid {
                detail: "max_member_bytes must be positive".into(),
            });
        }
        Ok(())
    }
}
