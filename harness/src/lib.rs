//! Seal Harness: the verification pipeline around the kernel.
//!
//! The harness resolves a seal in the operation log, stages its container,
//! and runs the kernel's Merkle and timestamp checks in order, reporting
//! one [`orchestrator::VerificationOutcome`] per job.
//!
//! The harness does NOT hash, parse tokens, or validate signatures itself;
//! it delegates all of that to the kernel. Collaborators (log, object
//! storage, trust store) are injected through the traits in [`store`].

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod context;
pub mod error;
pub mod fs_store;
pub mod memory;
pub mod merkle_stage;
pub mod metadata;
pub mod orchestrator;
pub mod staging;
pub mod store;
pub mod timestamp_stage;
