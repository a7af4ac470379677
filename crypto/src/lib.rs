//! Cryptographic primitives for the obol chain.
//!
//! - **Double SHA-256** for object digests and transaction ids
//! - **HASH160** (SHA-256 then RIPEMD-160) for key ids
//! - **Compact recoverable ECDSA** over secp256k1 for vote signatures
//! - **Base58check** pay-to-pubkey-hash address encoding

pub mod address;
pub mod hash;
pub mod sign;

pub use address::{decode_address, encode_address};
pub use hash::{hash160, key_id, sha256d, txid};
pub use sign::{pubkey_from_slice, public_from_private, recover_compact, sign_compact};
