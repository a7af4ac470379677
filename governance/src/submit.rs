//! Construction of the fee-paying transactions that carry governance
//! payloads on chain.
//!
//! Proposals ride in a single OP_RETURN output worth the consensus proposal
//! fee. Votes are packed many-to-a-transaction: one input per controlling
//! key proves authorship, each OP_RETURN output carries one signed vote,
//! and each input's value returns to its own address minus an equal share
//! of the fee.

use crate::chain::{CoinControl, SpendableCoin, Wallet};
use crate::config::GovernanceConfig;
use crate::error::GovernanceError;
use crate::proposal::Proposal;
use crate::state::Governance;
use crate::vote::{Vote, VoteType};
use obol_crypto::decode_address;
use obol_types::{
    Amount, Hash256, KeyId, OutPoint, Script, Transaction, TxOut, MAX_OP_RETURN_IN_TRANSACTION,
    MAX_OP_RETURN_RELAY,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// A proposal paired with the vote to cast on it.
#[derive(Clone, Debug)]
pub struct ProposalVote {
    pub proposal: Proposal,
    pub vote: VoteType,
}

/// Estimated bytes per funded input, used for fee estimation.
const INPUT_FEE_BYTES: usize = 150;

/// Submits `proposal` to the network inside a fee-paying transaction.
///
/// Wallets are tried in order; the first unlocked wallet able to cover the
/// fee wins. If a proposal address is configured, inputs are restricted to
/// that address and change returns to it; otherwise change goes to the
/// wallet's largest coin.
pub fn submit_proposal(
    proposal: &Proposal,
    wallets: &[Arc<dyn Wallet>],
    governance: &Governance,
    config: &GovernanceConfig,
) -> Result<Transaction, GovernanceError> {
    let params = governance.params();
    proposal.validate(params)?;

    let op_return = TxOut::new(
        params.proposal_fee,
        Script::op_return(&proposal.encode()),
    );

    let restrict_to = match &config.proposal_address {
        Some(address) => Some(decode_address(address).ok_or_else(|| {
            GovernanceError::Config(
                "bad proposaladdress, only p2pkh addresses are accepted".into(),
            )
        })?),
        None => None,
    };

    for wallet in wallets {
        if wallet.is_locked() || wallet.balance() <= params.proposal_fee {
            continue;
        }
        let mut coins = wallet.spendable_coins();
        if coins.is_empty() {
            continue;
        }

        let mut coin_control = CoinControl {
            allow_other_inputs: true,
            ..CoinControl::default()
        };
        if let Some(keyid) = restrict_to {
            // Spend only from the proposal address, consuming small coins
            // first, and require headroom above the fee for the network fee.
            coins.sort_by_key(|c| c.value);
            let mut selected = Amount::ZERO;
            for coin in coins.iter().filter(|c| c.key_id == keyid) {
                coin_control.selected.push(coin.outpoint);
                selected += coin.value;
                if selected > params.proposal_fee {
                    break;
                }
            }
            if selected <= params.proposal_fee {
                continue;
            }
            coin_control.allow_other_inputs = false;
            coin_control.change = Some(keyid);
        } else {
            // Change goes to the address of the largest coin.
            coins.sort_by(|a, b| b.value.cmp(&a.value));
            coin_control.change = coins.first().map(|c| c.key_id);
        }

        let tx = wallet
            .create_transaction(std::slice::from_ref(&op_return), &coin_control)
            .map_err(|reason| {
                GovernanceError::InsufficientFunds(format!(
                    "failed to create the proposal transaction: {}",
                    reason
                ))
            })?;
        wallet
            .commit_transaction(&tx)
            .map_err(GovernanceError::Relay)?;
        return Ok(tx);
    }

    Err(GovernanceError::InsufficientFunds(format!(
        "check that a wallet is unlocked with a balance above {}",
        params.proposal_fee
    )))
}

/// Casts votes on a set of proposals from every wallet's eligible coins.
///
/// Per wallet: spendable coins are enumerated ascending by value; for each
/// controlling key the smallest coin worth at least 60% of the configured
/// vote-input amount is reserved as the transaction input, and the
/// remaining coins at or above the voting minimum form the vote set. Every
/// (vote coin, proposal) pair that has not voted yet yields one signed
/// OP_RETURN output. Transactions are sealed at
/// [`MAX_OP_RETURN_IN_TRANSACTION`] outputs and committed; committed
/// transactions stay broadcast even if a later one fails.
pub fn submit_votes(
    requests: &[ProposalVote],
    wallets: &[Arc<dyn Wallet>],
    governance: &Governance,
    config: &GovernanceConfig,
) -> Result<Vec<Transaction>, GovernanceError> {
    let params = governance.params();
    if requests.is_empty() {
        return Err(GovernanceError::InvalidVote("no proposals specified".into()));
    }
    for request in requests {
        request.proposal.validate(params)?;
    }
    if wallets.is_empty() {
        return Err(GovernanceError::InsufficientFunds(
            "no wallets were found".into(),
        ));
    }
    let mut total = Amount::ZERO;
    for wallet in wallets {
        if wallet.is_locked() {
            return Err(GovernanceError::WalletLocked);
        }
        total += wallet.balance();
    }
    if total < params.vote_balance {
        return Err(GovernanceError::InsufficientFunds(format!(
            "not enough coin to cast a vote, {} is required",
            params.vote_balance
        )));
    }

    let input_floor = Amount::new(config.vote_input_amount.raw() * 6 / 10);
    let mut committed = Vec::new();
    // (utxo, proposal) pairs queued in transactions built here.
    let mut queued: HashMap<OutPoint, HashSet<Hash256>> = HashMap::new();

    for wallet in wallets {
        let mut exhausted = false;
        while !exhausted {
            let mut coins = wallet.spendable_coins();
            coins.sort_by_key(|c| c.value);
            if coins.is_empty() {
                break;
            }

            // One funding input per key id: the smallest coin near the
            // configured input amount. Everything else that clears the
            // voting minimum votes.
            let mut input_coins: BTreeMap<KeyId, SpendableCoin> = BTreeMap::new();
            let mut vote_coins: Vec<SpendableCoin> = Vec::new();
            for coin in coins {
                if !input_coins.contains_key(&coin.key_id) && coin.value >= input_floor {
                    input_coins.insert(coin.key_id, coin);
                    continue;
                }
                if coin.value < params.vote_min_utxo_amount {
                    continue;
                }
                vote_coins.push(coin);
            }
            if vote_coins.is_empty() || input_coins.is_empty() {
                break;
            }

            let mut vote_outs: Vec<TxOut> = Vec::new();
            exhausted = true;
            'fill: for (i, coin) in vote_coins.iter().enumerate() {
                let Some(key) = wallet.secret_key(&coin.key_id) else {
                    continue;
                };
                for (j, request) in requests.iter().enumerate() {
                    let proposal_hash = request.proposal.hash();
                    if queued
                        .get(&coin.outpoint)
                        .is_some_and(|set| set.contains(&proposal_hash))
                    {
                        continue;
                    }
                    if governance.has_vote_for(&proposal_hash, &coin.outpoint) {
                        continue;
                    }

                    let mut vote = Vote::new(proposal_hash, request.vote, coin.outpoint);
                    vote.load_utxo_meta(governance.utxos());
                    if !vote.sign(&key) {
                        warn!(
                            proposal = request.proposal.name(),
                            utxo = ?coin.outpoint,
                            "utxo signing failed, skipping vote"
                        );
                        continue;
                    }
                    if let Err(err) = vote.validate(params, governance.utxos(), true) {
                        warn!(proposal = request.proposal.name(), %err, "skipping vote");
                        continue;
                    }

                    vote_outs.push(TxOut::new(Amount::ZERO, Script::op_return(&vote.encode())));
                    queued.entry(coin.outpoint).or_default().insert(proposal_hash);
                    exhausted = i == vote_coins.len() - 1 && j == requests.len() - 1;

                    if vote_outs.len() == MAX_OP_RETURN_IN_TRANSACTION && !exhausted {
                        break 'fill;
                    }
                }
            }
            if vote_outs.is_empty() {
                break;
            }

            // Pay each funding input back to its own address, splitting the
            // estimated fee equally.
            let fee_bytes =
                input_coins.len() * INPUT_FEE_BYTES + vote_outs.len() * MAX_OP_RETURN_RELAY;
            let fee = wallet.minimum_fee(fee_bytes);
            let fee_per_input = Amount::new(fee.raw() / input_coins.len() as i64);

            let mut coin_control = CoinControl {
                change: input_coins.keys().next().copied(),
                ..CoinControl::default()
            };
            let mut outputs = vote_outs;
            for (keyid, coin) in &input_coins {
                coin_control.selected.push(coin.outpoint);
                outputs.push(TxOut::new(
                    coin.value.saturating_sub(fee_per_input),
                    Script::p2pkh(keyid),
                ));
            }

            let tx = wallet
                .create_transaction(&outputs, &coin_control)
                .map_err(|reason| {
                    GovernanceError::InsufficientFunds(format!(
                        "failed to create the vote transaction: {}",
                        reason
                    ))
                })?;
            wallet
                .commit_transaction(&tx)
                .map_err(GovernanceError::Relay)?;
            committed.push(tx);
        }
    }

    if committed.is_empty() {
        return Err(GovernanceError::InsufficientFunds(format!(
            "no votes were created; is a wallet unlocked with at least {} available?",
            params.vote_balance
        )));
    }
    Ok(committed)
}
