//! Proof module: domain-separated hashing, canonical JSON, Merkle construction.
//!
//! Depends on nothing internal. Every digest the kernel produces flows
//! through [`hash::canonical_hash`] or [`hash::domain_digest`].

pub mod canon;
pub mod hash;
pub mod hash_domain;
pub mod merkle;
