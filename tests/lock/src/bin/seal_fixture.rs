//! Binary that writes an offline seal fixture and prints deterministic
//! output lines for cross-process verification.
//!
//! Usage: `seal_fixture <out_dir>`
//! Writes `<out_dir>/log`, `<out_dir>/objects` and
//! `<out_dir>/trust_store.json`, then prints four lines, each `key=value`:
//!   `seal_id`=seal-fixture-0001
//!   `root_hash`=sha256:...
//!   `container_digest`=sha256:...
//!   `operation_count`=7

use std::path::PathBuf;

use lock_tests::fixtures::{operations, OfflineLayout, Pki, SealParts};
use seal_kernel::proof::hash::{canonical_hash, HashDomain};

const SEAL_ID: &str = "seal-fixture-0001";
const OPERATION_COUNT: usize = 7;

fn main() {
    let out_dir: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .expect("usage: seal_fixture <out_dir>");

    let pki = Pki::new();
    let parts = SealParts::build(SEAL_ID, &operations(OPERATION_COUNT), &pki);
    OfflineLayout::under(&out_dir)
        .write(std::slice::from_ref(&parts), &pki.trust_store())
        .expect("fixture write failed");

    let container = parts.container();
    println!("seal_id={SEAL_ID}");
    println!("root_hash={}", parts.manifest.declared_root_hash.as_str());
    println!(
        "container_digest={}",
        canonical_hash(HashDomain::StagedArtifact, &container).as_str()
    );
    println!("operation_count={OPERATION_COUNT}");
}
