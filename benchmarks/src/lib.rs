//! Shared helpers for seal verification benchmark suites.

use lock_tests::fixtures::{operations, Pki, SealParts};

/// Seal sizes the suites sweep over.
pub const SEAL_SIZES: [usize; 3] = [16, 256, 4096];

/// A consistent seal over `count` fixture operations.
///
/// # Panics
///
/// Panics if fixture encoding fails. Benchmark setup failures are fatal.
#[must_use]
pub fn seal_of(count: usize, pki: &Pki) -> SealParts {
    SealParts::build(&format!("bench-{count}"), &operations(count), pki)
}

/// Throughput element count for `count` operations.
#[must_use]
pub fn elements(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}
