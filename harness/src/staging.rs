//! `ContainerStager`: fetch a seal container and materialize its members.
//!
//! The staging area `<staging_root>/<tenant>_<request_id>` belongs to one
//! job. It is created exclusively (an existing directory is a conflict and
//! is left alone) and removed when the [`StagingArea`] guard is closed or
//! dropped, whatever the outcome of the job.
//!
//! Members are looked up by exact name; anything else in the archive is
//! ignored. Each member is read with a size cap, written into the staging
//! area, and read back, so the verifier works from the staged copy.

use std::io::{Cursor, ErrorKind, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use seal_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};
use seal_kernel::seal::manifest::SealManifest;

use crate::context::VerificationContext;
use crate::error::FatalFault;
use crate::store::{ObjectStore, ObjectStoreError};

/// Container member holding the operations document.
pub const OPERATIONS_MEMBER: &str = "operations.json";
/// Container member holding the serialized Merkle tree.
pub const TREE_MEMBER: &str = "merkle_tree.json";
/// Container member holding the timestamp token.
pub const TOKEN_MEMBER: &str = "token.tst";

/// The members every seal container must carry, in staging order.
pub const CONTAINER_MEMBERS: [&str; 3] = [OPERATIONS_MEMBER, TREE_MEMBER, TOKEN_MEMBER];

/// Exclusive staging directory of one job. Removed on close or drop.
#[derive(Debug)]
pub struct StagingArea {
    path: PathBuf,
    removed: bool,
}

impl StagingArea {
    fn create(staging_root: &Path, ctx: &VerificationContext) -> Result<Self, FatalFault> {
        std::fs::create_dir_all(staging_root).map_err(|e| FatalFault::StagingIo {
            detail: format!("create_dir_all {}: {e}", staging_root.display()),
        })?;
        let path = staging_root.join(ctx.staging_dir_name());
        match std::fs::create_dir(&path) {
            Ok(()) => Ok(Self {
                path,
                removed: false,
            }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(FatalFault::StagingConflict {
                path: path.display().to_string(),
            }),
            Err(e) => Err(FatalFault::StagingIo {
                detail: format!("create_dir {}: {e}", path.display()),
            }),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staging directory now, reporting failure.
    ///
    /// # Errors
    ///
    /// Returns [`FatalFault::StagingCleanup`] if the directory could not be
    /// removed.
    pub fn close(mut self) -> Result<(), FatalFault> {
        self.removed = true;
        std::fs::remove_dir_all(&self.path).map_err(|e| FatalFault::StagingCleanup {
            path: self.path.display().to_string(),
            detail: e.to_string(),
        })
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "staging area cleanup failed");
        }
    }
}

/// Digest record of one staged member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedArtifact {
    pub name: String,
    pub size: u64,
    pub digest: ContentHash,
}

/// The three staged members, read back from the staging area.
#[derive(Debug)]
pub struct StagedContainer {
    area: StagingArea,
    operations: Vec<u8>,
    tree: Vec<u8>,
    token: Vec<u8>,
    artifacts: Vec<StagedArtifact>,
}

impl StagedContainer {
    #[must_use]
    pub fn operations_bytes(&self) -> &[u8] {
        &self.operations
    }

    #[must_use]
    pub fn tree_bytes(&self) -> &[u8] {
        &self.tree
    }

    #[must_use]
    pub fn token_bytes(&self) -> &[u8] {
        &self.token
    }

    /// One record per member, in [`CONTAINER_MEMBERS`] order.
    #[must_use]
    pub fn artifacts(&self) -> &[StagedArtifact] {
        &self.artifacts
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.area.path()
    }

    /// Release the staged bytes and remove the staging area.
    ///
    /// # Errors
    ///
    /// Returns [`FatalFault::StagingCleanup`] if removal fails.
    pub fn close(self) -> Result<(), FatalFault> {
        self.area.close()
    }
}

/// Fetches containers from an [`ObjectStore`] into per-job staging areas.
#[derive(Debug)]
pub struct ContainerStager<O> {
    object_store: O,
    staging_root: PathBuf,
    max_member_bytes: u64,
}

impl<O: ObjectStore> ContainerStager<O> {
    pub fn new(object_store: O, staging_root: impl Into<PathBuf>, max_member_bytes: u64) -> Self {
        Self {
            object_store,
            staging_root: staging_root.into(),
            max_member_bytes,
        }
    }

    #[must_use]
    pub fn object_store(&self) -> &O {
        &self.object_store
    }

    /// Stage the container named by `manifest`.
    ///
    /// # Errors
    ///
    /// Every failure is a [`FatalFault`]: staging conflict or I/O, missing
    /// or unreachable container, corrupt archive, missing or oversized
    /// member.
    #[instrument(level = "debug", skip_all, fields(container = %manifest.container_name))]
    pub fn stage(
        &self,
        ctx: &VerificationContext,
        manifest: &SealManifest,
    ) -> Result<StagedContainer, FatalFault> {
        let area = StagingArea::create(&self.staging_root, ctx)?;

        let bytes = self
            .object_store
            .fetch_container(ctx, &manifest.container_name)
            .map_err(|e| match e {
                ObjectStoreError::NotFound { name } => FatalFault::ContainerNotFound { name },
                ObjectStoreError::Io { detail } => FatalFault::ObjectStoreUnavailable { detail },
            })?;
        debug!(bytes = bytes.len(), "container fetched");

        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| FatalFault::CorruptContainer {
                detail: e.to_string(),
            })?;

        let mut staged = Vec::with_capacity(CONTAINER_MEMBERS.len());
        let mut artifacts = Vec::with_capacity(CONTAINER_MEMBERS.len());
        for name in CONTAINER_MEMBERS {
            let member = self.extract_member(&mut archive, name)?;
            let path = area.path().join(name);
            std::fs::write(&path, &member).map_err(|e| FatalFault::StagingIo {
                detail: format!("write {}: {e}", path.display()),
            })?;
            let read_back = std::fs::read(&path).map_err(|e| FatalFault::StagingIo {
                detail: format!("read {}: {e}", path.display()),
            })?;
            let artifact = StagedArtifact {
                name: name.into(),
                size: byte_len(&read_back),
                digest: canonical_hash(HashDomain::StagedArtifact, &read_back),
            };
            debug!(member = name, size = artifact.size, digest = %artifact.digest, "member staged");
            artifacts.push(artifact);
            staged.push(read_back);
        }

        info!(path = %area.path().display(), "container staged");
        let [operations, tree, token]: [Vec<u8>; 3] =
            staged.try_into().map_err(|_| FatalFault::StagingIo {
                detail: "staged member count mismatch".into(),
            })?;
        Ok(StagedContainer {
            area,
            operations,
            tree,
            token,
            artifacts,
        })
    }

    fn extract_member(
        &self,
        archive: &mut ZipArchive<Cursor<Vec<u8>>>,
        name: &str,
    ) -> Result<Vec<u8>, FatalFault> {
        let too_large = || FatalFault::MemberTooLarge {
            name: name.into(),
            limit: self.max_member_bytes,
        };

        let mut file = archive.by_name(name).map_err(|e| match e {
            ZipError::FileNotFound => FatalFault::MissingMember { name: name.into() },
            other => FatalFault::CorruptContainer {
                detail: format!("{name}: {other}"),
            },
        })?;
        if file.size() > self.max_member_bytes {
            return Err(too_large());
        }

        let mut buf = Vec::new();
        (&mut file)
            .take(self.max_member_bytes.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|e| FatalFault::CorruptContainer {
                detail: format!("{name}: {e}"),
            })?;
        if byte_len(&buf) > self.max_member_bytes {
            return Err(too_large());
        }
        Ok(buf)
    }
}

fn byte_len(bytes: &[u8]) -> u64 {
    u64::try_from(bytes.len()).unwrap_or(u64::MAX)
}
