//! The block view consumed by the governance core.

use crate::hash::Hash256;
use crate::transaction::Transaction;

/// A block as delivered by the chain's block store.
///
/// Only the fields the governance engine reads: the block time stamps votes,
/// and the transaction list carries OP_RETURN payloads and spends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub version: i32,
    pub prev_block: Hash256,
    pub time: i64,
    pub txs: Vec<Transaction>,
}

impl Block {
    pub fn new(time: i64, txs: Vec<Transaction>) -> Self {
        Self {
            version: 1,
            prev_block: Hash256::ZERO,
            time,
            txs,
        }
    }
}
