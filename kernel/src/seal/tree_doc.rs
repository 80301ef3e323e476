//! `merkle_tree.json`: the tree saved alongside the operations at seal time.
//!
//! ```json
//! {"algorithm":"seal-merkle.v1","leaf_count":3,
//!  "levels":[["<hex>","<hex>","<hex>"],["<hex>","<hex>"],["<hex>"]],
//!  "root":"sha256:<hex>","schema_version":"seal_merkle_tree.v1"}
//! ```
//!
//! Verification rebuilds its own tree from the operations and compares the
//! two with [`first_divergence`]. The saved root is never trusted as a
//! reference hash. A saved root that differs from the rebuilt one is KO;
//! any other divergence is a WARNING.

use serde::{Deserialize, Serialize};

use crate::proof::canon::{to_canonical_bytes, CanonError};
use crate::proof::hash::{decode_digest, ContentHash};
use crate::proof::merkle::{MerkleTree, NodeHash, MERKLE_ALGORITHM};
use crate::verdict::StatusCode;

/// Schema version of the serialized tree document.
pub const TREE_SCHEMA_VERSION: &str = "seal_merkle_tree.v1";

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SerializedTreeV1 {
    schema_version: String,
    algorithm: String,
    leaf_count: u64,
    levels: Vec<Vec<String>>,
    root: ContentHash,
}

/// Decoded serialized tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedTree {
    pub leaf_count: usize,
    pub levels: Vec<Vec<NodeHash>>,
    pub root: ContentHash,
}

/// Errors from decoding `merkle_tree.json`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeParseError {
    #[error("tree document is not valid JSON: {detail}")]
    InvalidJson { detail: String },
    #[error("unsupported tree schema: {found}")]
    UnsupportedSchema { found: String },
    /// The tree was built with an algorithm this verifier cannot reproduce.
    #[error("unknown Merkle algorithm: {found}")]
    UnknownAlgorithm { found: String },
    #[error("level {level} node {index}: {detail}")]
    BadNode {
        level: usize,
        index: usize,
        detail: String,
    },
    #[error("malformed tree: {detail}")]
    Malformed { detail: String },
}

/// First point where a rebuilt tree and a saved tree disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeDivergence {
    LeafCount { rebuilt: usize, saved: usize },
    Height { rebuilt: usize, saved: usize },
    LevelWidth {
        level: usize,
        rebuilt: usize,
        saved: usize,
    },
    Node { level: usize, index: usize },
    /// The root field or the top level does not name the rebuilt root.
    Root,
}

impl TreeDivergence {
    /// Status of the saved-tree check for this divergence.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Root => StatusCode::Ko,
            _ => StatusCode::Warning,
        }
    }
}

impl std::fmt::Display for TreeDivergence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LeafCount { rebuilt, saved } => {
                write!(f, "leaf count differs: rebuilt {rebuilt}, saved {saved}")
            }
            Self::Height { rebuilt, saved } => {
                write!(f, "height differs: rebuilt {rebuilt}, saved {saved}")
            }
            Self::LevelWidth {
                level,
                rebuilt,
                saved,
            } => write!(
                f,
                "level {level} width differs: rebuilt {rebuilt}, saved {saved}"
            ),
            Self::Node { level, index } => write!(f, "node differs at level {level}, index {index}"),
            Self::Root => f.write_str("saved root differs from rebuilt root"),
        }
    }
}

/// Decode `merkle_tree.json` bytes.
///
/// # Errors
///
/// Returns [`TreeParseError`] on malformed JSON, unknown schema or algorithm,
/// undecodable node hex, or a document without levels.
pub fn parse_tree(bytes: &[u8]) -> Result<SavedTree, TreeParseError> {
    let doc: SerializedTreeV1 =
        serde_json::from_slice(bytes).map_err(|e| TreeParseError::InvalidJson {
            detail: e.to_string(),
        })?;
    if doc.schema_version != TREE_SCHEMA_VERSION {
        return Err(TreeParseError::UnsupportedSchema {
            found: doc.schema_version,
        });
    }
    if doc.algorithm != MERKLE_ALGORITHM {
        return Err(TreeParseError::UnknownAlgorithm {
            found: doc.algorithm,
        });
    }
    if doc.levels.is_empty() {
        return Err(TreeParseError::Malformed {
            detail: "no levels".into(),
        });
    }
    let leaf_count = usize::try_from(doc.leaf_count).map_err(|_| TreeParseError::Malformed {
        detail: "leaf_count too large".into(),
    })?;

    let mut levels = Vec::with_capacity(doc.levels.len());
    for (level, nodes) in doc.levels.iter().enumerate() {
        let decoded = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                decode_digest(node).map_err(|detail| TreeParseError::BadNode {
                    level,
                    index,
                    detail,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        levels.push(decoded);
    }

    Ok(SavedTree {
        leaf_count,
        levels,
        root: doc.root,
    })
}

/// Encode a tree as a canonical `merkle_tree.json` document.
///
/// # Errors
///
/// Returns [`CanonError`] if the document does not serialize.
pub fn tree_to_bytes(tree: &MerkleTree) -> Result<Vec<u8>, CanonError> {
    to_canonical_bytes(&SerializedTreeV1 {
        schema_version: TREE_SCHEMA_VERSION.into(),
        algorithm: MERKLE_ALGORITHM.into(),
        leaf_count: tree.leaf_count() as u64,
        levels: tree
            .levels()
            .iter()
            .map(|level| level.iter().map(hex::encode).collect())
            .collect(),
        root: tree.root_hash(),
    })
}

/// Compare a rebuilt tree with a saved one: the root claim first, then the
/// structure leaves first.
///
/// Returns `None` when every level and the root field agree.
#[must_use]
pub fn first_divergence(rebuilt: &MerkleTree, saved: &SavedTree) -> Option<TreeDivergence> {
    let root = rebuilt.root();
    let top_is_root = saved
        .levels
        .last()
        .is_some_and(|top| top.as_slice() == [root]);
    if saved.root != rebuilt.root_hash() || !top_is_root {
        return Some(TreeDivergence::Root);
    }
    if rebuilt.leaf_count() != saved.leaf_count {
        return Some(TreeDivergence::LeafCount {
            rebuilt: rebuilt.leaf_count(),
            saved: saved.leaf_count,
        });
    }
    if rebuilt.height() != saved.levels.len() {
        return Some(TreeDivergence::Height {
            rebuilt: rebuilt.height(),
            saved: saved.levels.len(),
        });
    }
    for (level, (ours, theirs)) in rebuilt.levels().iter().zip(&saved.levels).enumerate() {
        if ours.len() != theirs.len() {
            return Some(TreeDivergence::LevelWidth {
                level,
                rebuilt: ours.len(),
                saved: theirs.len(),
            });
        }
        if let Some(index) = ours.iter().zip(theirs).position(|(a, b)| a != b) {
            return Some(TreeDivergence::Node { level, index });
        }
    }
    None
}
