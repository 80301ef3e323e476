//! Timestamp tokens: the binary `TST1` codec, certificates, signatures and
//! trust validation.
//!
//! # Wire layout
//!
//! ```text
//! [magic:4 = "TST1"]
//! [info_len:u32le][info: canonical JSON]            -- signed under TokenInfo
//! [sig_alg:u8][sig_len:u16le][signature]
//! [cert_count:u8] { [cert_len:u32le][certificate] } -- signer first
//!
//! certificate :=
//! [tbs_len:u16le][tbs: canonical JSON]              -- signed under CertificateTbs
//! [sig_alg:u8][sig_len:u16le][signature]
//! ```

pub mod reader;
pub mod signature;
pub mod trust_store;
pub mod types;
pub mod validate;
pub mod writer;
