//! Token reader robustness: malformed token bytes produce typed errors,
//! never panics, and a valid token survives only byte-exact.

use lock_tests::fixtures::{operations, tree_of, Pki, GEN_TIME};
use proptest::prelude::*;
use seal_kernel::token::reader::bytes_to_token;
use seal_kernel::token::writer::token_to_bytes;

fn valid_token_bytes() -> Vec<u8> {
    let pki = Pki::new();
    let token = pki.timestamp(&tree_of(&operations(2)).root(), GEN_TIME);
    token_to_bytes(&token).unwrap()
}

#[test]
fn valid_token_parses_and_reencodes_identically() {
    let bytes = valid_token_bytes();
    let token = bytes_to_token(&bytes).unwrap();
    assert_eq!(token_to_bytes(&token).unwrap(), bytes);
}

#[test]
fn every_proper_prefix_is_rejected() {
    let bytes = valid_token_bytes();
    for len in 0..bytes.len() {
        assert!(
            bytes_to_token(&bytes[..len]).is_err(),
            "prefix of {len} bytes accepted"
        );
    }
}

#[test]
fn trailing_byte_is_rejected() {
    let mut bytes = valid_token_bytes();
    bytes.push(0);
    assert!(bytes_to_token(&bytes).is_err());
}

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = bytes_to_token(&data);
    }

    #[test]
    fn single_byte_corruption_never_panics(index in any::<prop::sample::Index>(), flip in 1u8..=255) {
        let mut bytes = valid_token_bytes();
        let at = index.index(bytes.len());
        bytes[at] ^= flip;
        let _ = bytes_to_token(&bytes);
    }

    #[test]
    fn valid_magic_with_garbage_tail_is_rejected(tail in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut bytes = b"TST1".to_vec();
        bytes.extend_from_slice(&tail);
        prop_assert!(bytes_to_token(&bytes).is_err());
    }
}
