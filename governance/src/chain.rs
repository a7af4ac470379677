//! Interfaces to the chain collaborators the governance engine consumes.
//!
//! The engine never owns chain state. The embedding node supplies the utxo
//! set, the block store, wallets, and the shutdown signal through these
//! traits; tests supply in-memory doubles.

use obol_types::{Amount, Block, KeyId, OutPoint, PrivateKey, Script, Transaction, TxOut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An unspent output as seen by the utxo set.
#[derive(Clone, Debug)]
pub struct Coin {
    pub value: Amount,
    pub script_pubkey: Script,
}

/// Read access to the node's utxo set.
pub trait UtxoView: Send + Sync {
    /// The coin at `outpoint`, if it exists in the view.
    fn coin(&self, outpoint: &OutPoint) -> Option<Coin>;

    /// Whether `outpoint` is unavailable for spending. With
    /// `include_mempool` the check also considers pending transactions;
    /// the bootstrap loader disables it because the mempool may not be
    /// loaded yet.
    fn is_spent(&self, outpoint: &OutPoint, include_mempool: bool) -> bool;
}

/// Read access to the block store, totally ordered by height.
pub trait BlockSource: Send + Sync {
    /// Current chain height. Implementations take the chain mutex briefly.
    fn height(&self) -> i32;

    /// Reads the block at `height` from disk. No locks are held across the
    /// read.
    fn read_block(&self, height: i32) -> Option<Block>;
}

/// Chain events the governance engine subscribes to. The chain-event
/// dispatcher delivers these in canonical order per chain.
pub trait ChainListener: Send + Sync {
    fn on_block_connected(&self, block: &Block, height: i32);
    fn on_block_disconnected(&self, block: &Block);
}

/// A spendable wallet coin, with the key id its locking script pays.
#[derive(Clone, Debug)]
pub struct SpendableCoin {
    pub outpoint: OutPoint,
    pub value: Amount,
    pub key_id: KeyId,
}

/// Input selection handed to the wallet's transaction builder.
#[derive(Clone, Debug, Default)]
pub struct CoinControl {
    /// Outpoints the transaction must spend.
    pub selected: Vec<OutPoint>,
    /// Destination for change.
    pub change: Option<KeyId>,
    /// Whether the wallet may add inputs beyond `selected`.
    pub allow_other_inputs: bool,
}

/// The wallet operations the transaction builder consumes.
pub trait Wallet: Send + Sync {
    fn is_locked(&self) -> bool;

    fn balance(&self) -> Amount;

    fn spendable_coins(&self) -> Vec<SpendableCoin>;

    /// The private key controlling `key_id`, if this wallet holds it.
    fn secret_key(&self, key_id: &KeyId) -> Option<PrivateKey>;

    /// Minimum relay fee for a transaction of `tx_bytes` bytes.
    fn minimum_fee(&self, tx_bytes: usize) -> Amount;

    /// Funds and signs a transaction paying `outputs` under the given coin
    /// control. Errors are human-readable reasons.
    fn create_transaction(
        &self,
        outputs: &[TxOut],
        coin_control: &CoinControl,
    ) -> Result<Transaction, String>;

    /// Commits and relays a created transaction.
    fn commit_transaction(&self, tx: &Transaction) -> Result<(), String>;
}

/// Process-wide cooperative shutdown flag, polled by the bootstrap workers.
#[derive(Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
