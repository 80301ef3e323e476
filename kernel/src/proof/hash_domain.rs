//! Typed domain separators for canonical hashing.
//!
//! Every production hash computation MUST select a domain via [`HashDomain`].
//! This module is the single authority for domain-separator byte strings.
//! Adding a new domain is a single change here: the enum, `as_bytes()`,
//! `ALL`, and `Display` are all generated from the same macro invocation.
//!
//! Changing any byte string breaks every previously published seal. New
//! formats get a new `::V2\0` domain instead.

/// Declares `HashDomain` enum, `as_bytes()`, `ALL`, and `Display` from one list.
macro_rules! define_hash_domains {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident => $bytes:expr
        ),+ $(,)?
    ) => {
        /// Typed domain separator for [`super::hash::canonical_hash`].
        ///
        /// Every variant maps to a unique, null-terminated byte string used as
        /// a SHA-256 prefix.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum HashDomain {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl HashDomain {
            /// The raw domain-separator bytes (null-terminated).
            #[must_use]
            pub const fn as_bytes(&self) -> &'static [u8] {
                match self {
                    $( Self::$variant => $bytes, )+
                }
            }

            /// All domain variants in declaration order.
            pub const ALL: &[HashDomain] = &[
                $( Self::$variant, )+
            ];
        }

        impl core::fmt::Display for HashDomain {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self {
                    $( Self::$variant => write!(f, stringify!($variant)), )+
                }
            }
        }
    };
}

define_hash_domains! {
    // -----------------------------------------------------------------------
    // Merkle tree (seal-merkle.v1)
    // -----------------------------------------------------------------------

    /// Leaf commitment over one operation's payload digest.
    MerkleLeaf => b"SEAL::MERKLE_LEAF::V1\0",

    /// Internal node commitment over `left || right`.
    MerkleNode => b"SEAL::MERKLE_NODE::V1\0",

    // -----------------------------------------------------------------------
    // Timestamp token
    // -----------------------------------------------------------------------

    /// Signature input prefix for the token info section.
    TokenInfo => b"SEAL::TIMESTAMP_TOKEN_INFO::V1\0",

    /// Signature input prefix for a certificate's to-be-signed section.
    CertificateTbs => b"SEAL::CERTIFICATE_TBS::V1\0",

    /// Certificate identity (trust-anchor matching).
    CertificateFingerprint => b"SEAL::CERTIFICATE_FINGERPRINT::V1\0",

    // -----------------------------------------------------------------------
    // Staging
    // -----------------------------------------------------------------------

    /// Content digest of a member extracted from a seal container.
    StagedArtifact => b"SEAL::STAGED_ARTIFACT::V1\0",
}
