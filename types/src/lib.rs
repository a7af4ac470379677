//! Fundamental types for the obol chain.
//!
//! This crate defines the primitives shared across every other crate in the
//! workspace: hashes, amounts, keys, scripts, transactions, blocks, consensus
//! parameters, and the canonical wire codec used for consensus serialization.

pub mod amount;
pub mod block;
pub mod encoding;
pub mod hash;
pub mod keys;
pub mod params;
pub mod script;
pub mod transaction;

pub use amount::{Amount, COIN};
pub use block::Block;
pub use encoding::{DecodeError, Decoder, Encoder};
pub use hash::Hash256;
pub use keys::{KeyId, PrivateKey, PublicKey, Signature};
pub use params::{ConsensusParams, MAX_OP_RETURN_IN_TRANSACTION, MAX_OP_RETURN_RELAY};
pub use script::Script;
pub use transaction::{OutPoint, Transaction, TxIn, TxOut};
