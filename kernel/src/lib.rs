//! Seal Kernel: the pure, I/O-free core of seal verification.
//!
//! # API Surface
//!
//! - [`proof::merkle::MerkleTree`] -- rebuild a seal's Merkle tree from payload digests
//! - [`seal`] -- the staged seal documents (operations list, serialized tree, manifest)
//! - [`token::reader::bytes_to_token`] -- decode a binary timestamp token
//! - [`token::validate::validate_token`] -- check a token against a trust store
//! - [`verdict`] -- the `OK < WARNING < KO < FATAL` status lattice and sub-verdicts
//!
//! # Module Dependency Direction
//!
//! `proof` ← `seal`, `proof` ← `token`; `verdict` imports nothing internal.
//!
//! One-way only. `seal` and `token` never import each other. Nothing here
//! touches the filesystem or logs.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod proof;
pub mod seal;
pub mod token;
pub mod verdict;
