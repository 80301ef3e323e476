//! Collaborator contracts: the narrow traits the verifier reads through.
//!
//! A collaborator provides:
//! - seal log records by seal id ([`LogStore`])
//! - container bytes by object name ([`ObjectStore`])
//! - the current trust anchors ([`TrustStoreLoader`])
//!
//! A collaborator does NOT provide:
//! - category checks, hashing, or signature checks (components do those)
//! - staging (the stager owns the staging directory)
//!
//! Implementations must be safe to call from several jobs at once; the
//! verifier holds no locks of its own.

use std::sync::Arc;

use seal_kernel::seal::manifest::SealManifest;
use seal_kernel::token::trust_store::{TrustStore, TrustStoreParseError};

use crate::context::VerificationContext;

/// Failure reading the operation log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogStoreError {
    #[error("log store unavailable: {detail}")]
    Unavailable { detail: String },
    #[error("log record unreadable: {detail}")]
    Corrupt { detail: String },
}

/// Failure reading the object store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object {name} not found")]
    NotFound { name: String },
    #[error("object store I/O error: {detail}")]
    Io { detail: String },
}

/// Failure loading the trust store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrustStoreLoadError {
    #[error("trust store I/O error: {detail}")]
    Io { detail: String },
    #[error(transparent)]
    Parse(#[from] TrustStoreParseError),
}

/// Read access to the seal records of the operation log.
pub trait LogStore {
    /// Every log record whose seal id is `seal_id`. Normally zero or one.
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError`] if the log cannot be queried.
    fn seal_records(
        &self,
        ctx: &VerificationContext,
        seal_id: &str,
    ) -> Result<Vec<SealManifest>, LogStoreError>;
}

/// Read access to content-addressed storage.
pub trait ObjectStore {
    /// The bytes stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::NotFound`] for an unknown name and
    /// [`ObjectStoreError::Io`] for any other failure.
    fn fetch_container(&self, ctx: &VerificationContext, name: &str)
        -> Result<Vec<u8>, ObjectStoreError>;
}

/// Source of the trust anchors, consulted once per job.
pub trait TrustStoreLoader {
    /// Load the current trust store.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreLoadError`] if the store cannot be read or decoded.
    fn load_trust_anchors(&self, ctx: &VerificationContext)
        -> Result<TrustStore, TrustStoreLoadError>;
}

macro_rules! forward_through_pointer {
    ($($ptr:ty),+) => {
        $(
            impl<S: LogStore + ?Sized> LogStore for $ptr {
                fn seal_records(
                    &self,
                    ctx: &VerificationContext,
                    seal_id: &str,
                ) -> Result<Vec<SealManifest>, LogStoreError> {
                    (**self).seal_records(ctx, seal_id)
                }
            }

            impl<S: ObjectStore + ?Sized> ObjectStore for $ptr {
                fn fetch_container(
                    &self,
                    ctx: &VerificationContext,
                    name: &str,
                ) -> Result<Vec<u8>, ObjectStoreError> {
                    (**self).fetch_container(ctx, name)
                }
            }

            impl<S: TrustStoreLoader + ?Sized> TrustStoreLoader for $ptr {
                fn load_trust_anchors(
                    &self,
                    ctx: &VerificationContext,
                ) -> Result<TrustStore, TrustStoreLoadError> {
                    (**self).load_trust_anchors(ctx)
                }
            }
        )+
    };
}

forward_through_pointer!(&S, Arc<S>, Box<S>);
