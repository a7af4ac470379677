//! On-chain governance for the obol network.
//!
//! Anyone may submit a spending **proposal** for a future superblock by
//! paying a fee, and coin holders cast weighted yes/no/abstain **votes** by
//! proving control of unspent outputs. Both travel inside ordinary
//! transactions as OP_RETURN payloads; this crate extracts them from
//! connected blocks, validates them against chain state, maintains the
//! in-memory governance state across connects, disconnects and spends, and
//! produces the sybil-resistant tally consumed at superblock time.
//!
//! State is not persisted: it is rebuilt from the chain on startup by
//! [`load_governance_data`], which sweeps the historical chain across all
//! available cores.

pub mod chain;
pub mod config;
pub mod error;
pub mod extract;
pub mod loader;
pub mod proposal;
pub mod state;
pub mod submit;
pub mod tally;
pub mod vote;
pub mod wire;

pub use chain::{
    BlockSource, ChainListener, Coin, CoinControl, ShutdownFlag, SpendableCoin, UtxoView, Wallet,
};
pub use config::GovernanceConfig;
pub use error::GovernanceError;
pub use extract::{data_from_block, BlockData};
pub use loader::load_governance_data;
pub use proposal::Proposal;
pub use state::Governance;
pub use submit::{submit_proposal, submit_votes, ProposalVote};
pub use tally::{tally, Tally};
pub use vote::{Vote, VoteType};
pub use wire::{classify, ObjectKind, NETWORK_VERSION};
