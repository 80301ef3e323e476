//! Seal documents: the manifest logged when a seal is produced and the two
//! JSON members of a seal container.

pub mod manifest;
pub mod operations;
pub mod tree_doc;
