use obol_types::{DecodeError, Hash256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("payload failed to decode: {0}")]
    Parse(#[from] DecodeError),

    #[error("invalid proposal: {0}")]
    InvalidProposal(String),

    #[error("invalid vote: {0}")]
    InvalidVote(String),

    #[error("vote references unknown proposal {0}")]
    MissingProposal(Hash256),

    #[error("no transaction input key matches the vote signature")]
    VinBindingFailure,

    #[error("past the submission cutoff for superblock {0}")]
    StaleByCutoff(i32),

    #[error("vote utxo is spent")]
    UtxoSpent,

    #[error("all wallets must be unlocked")]
    WalletLocked,

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("transaction rejected: {0}")]
    Relay(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("shutdown requested during chain scan")]
    ShutdownRequested,

    #[error("governance scan failed: {0}")]
    Bootstrap(String),
}
