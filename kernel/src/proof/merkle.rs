//! Merkle construction for `seal-merkle.v1`.
//!
//! ```text
//! leaf = sha256("SEAL::MERKLE_LEAF::V1\0" || payload_digest)
//! node = sha256("SEAL::MERKLE_NODE::V1\0" || left || right)
//! ```
//!
//! Levels are built bottom-up by pairing adjacent nodes. An odd node at the
//! end of a level is promoted unchanged to the next level (never duplicated).
//! A tree always has at least one leaf; the root of a one-leaf tree is the
//! leaf hash itself.

use super::hash::{domain_digest, ContentHash, HashDomain, SHA256_LEN};

/// Algorithm identifier written into serialized trees.
pub const MERKLE_ALGORITHM: &str = "seal-merkle.v1";

/// One 32-byte tree node.
pub type NodeHash = [u8; SHA256_LEN];

/// Errors from Merkle construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerkleError {
    /// No leaves: a seal of zero operations has no root.
    #[error("cannot build a Merkle tree from an empty leaf set")]
    EmptyLeafSet,
}

/// Leaf hash of one operation payload digest.
#[must_use]
pub fn leaf_hash(payload_digest: &NodeHash) -> NodeHash {
    domain_digest(HashDomain::MerkleLeaf, &[payload_digest.as_slice()])
}

/// Internal node hash of two children, in order.
#[must_use]
pub fn node_hash(left: &NodeHash, right: &NodeHash) -> NodeHash {
    domain_digest(HashDomain::MerkleNode, &[left.as_slice(), right.as_slice()])
}

/// A fully materialized tree: `levels[0]` are the leaves, the last level
/// holds exactly one node, the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<NodeHash>>,
}

impl MerkleTree {
    /// Build the tree over operation payload digests, in log order.
    ///
    /// # Errors
    ///
    /// Returns [`MerkleError::EmptyLeafSet`] if `payload_digests` is empty.
    pub fn from_payload_digests(payload_digests: &[NodeHash]) -> Result<Self, MerkleError> {
        if payload_digests.is_empty() {
            return Err(MerkleError::EmptyLeafSet);
        }

        let mut levels = vec![payload_digests.iter().map(leaf_hash).collect::<Vec<_>>()];
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let pairs = current.chunks_exact(2);
            let promoted = pairs.remainder().first().copied();
            let mut next: Vec<NodeHash> = pairs.map(|pair| node_hash(&pair[0], &pair[1])).collect();
            next.extend(promoted);
            levels.push(next);
        }
        Ok(Self { levels })
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeHash {
        // Construction guarantees a non-empty last level.
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or([0u8; SHA256_LEN])
    }

    /// The root as a `ContentHash` string.
    #[must_use]
    pub fn root_hash(&self) -> ContentHash {
        ContentHash::from_sha256(&self.root())
    }

    /// All levels, leaves first.
    #[must_use]
    pub fn levels(&self) -> &[Vec<NodeHash>] {
        &self.levels
    }

    /// Number of leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Height in levels, counting the leaf level.
    #[must_use]
    pub fn height(&self) -> usize {
        self.levels.len()
    }
}
