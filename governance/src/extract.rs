//! Extraction of governance objects from blocks.
//!
//! Scans every non-coinbase output for OP_RETURN payloads, routes candidate
//! payloads through the typed parsers, validates the results, and resolves
//! conflicts between votes that landed in the same block. Parse and
//! validation failures drop the object; the chain will carry correct data
//! if any exists.

use crate::chain::UtxoView;
use crate::error::GovernanceError;
use crate::proposal::Proposal;
use crate::vote::Vote;
use crate::wire::{classify, ObjectKind};
use obol_crypto::{key_id, pubkey_from_slice, txid};
use obol_types::{Block, ConsensusParams, Hash256, OutPoint, Transaction};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Valid governance objects found in one block.
#[derive(Debug, Default)]
pub struct BlockData {
    pub proposals: Vec<Proposal>,
    pub votes: Vec<Vote>,
}

/// Extracts the valid proposals and votes from `block`.
///
/// With `height` present, cutoff checks are enforced and votes must
/// reference a proposal that is either in this block or known to
/// `known_superblock`. The startup loader passes `height` for historical
/// blocks too but disables the mempool spent-check; the disconnect path
/// passes `None` because already-canonical objects need no cutoff.
///
/// Same-block conflict resolution: of two votes with the same identifying
/// hash, the one with the numerically larger `sig_hash` is kept.
pub fn data_from_block(
    block: &Block,
    height: Option<i32>,
    params: &ConsensusParams,
    utxos: &dyn UtxoView,
    mempool_check: bool,
    known_superblock: &dyn Fn(&Hash256) -> Option<i32>,
) -> BlockData {
    let mut proposals: HashMap<Hash256, Proposal> = HashMap::new();
    let mut votes: HashMap<Hash256, Vote> = HashMap::new();

    for tx in &block.txs {
        if tx.is_coinbase() {
            continue;
        }
        let carrier = txid(tx);
        for (n, out) in tx.outputs.iter().enumerate() {
            let Some(payload) = out.script_pubkey.op_return_payload() else {
                continue;
            };
            match classify(&payload) {
                Some(ObjectKind::Proposal) => {
                    let Ok(mut proposal) = Proposal::decode(&payload) else {
                        continue;
                    };
                    proposal.set_block_number(height.unwrap_or(0));
                    if let Err(err) = proposal.validate(params) {
                        debug!(%err, "dropping proposal from block");
                        continue;
                    }
                    if let Some(h) = height {
                        if !proposal.meets_cutoff(h, params) {
                            let err = GovernanceError::StaleByCutoff(proposal.superblock());
                            debug!(%err, name = proposal.name(), height = h, "dropping proposal");
                            continue;
                        }
                    }
                    proposals.insert(proposal.hash(), proposal);
                }
                Some(ObjectKind::Vote) => {
                    let outpoint = OutPoint::new(carrier, n as u32);
                    let Ok(mut vote) =
                        Vote::decode(&payload, outpoint, block.time, height.unwrap_or(0))
                    else {
                        continue;
                    };
                    vote.load_utxo_meta(utxos);
                    if let Err(err) = vote.validate(params, utxos, mempool_check) {
                        debug!(%err, "dropping vote from block");
                        continue;
                    }
                    if let Some(h) = height {
                        // The referenced proposal may have been mined in this
                        // very block.
                        let superblock = proposals
                            .get(&vote.proposal())
                            .map(Proposal::superblock)
                            .or_else(|| known_superblock(&vote.proposal()));
                        let Some(superblock) = superblock else {
                            let err = GovernanceError::MissingProposal(vote.proposal());
                            debug!(%err, "dropping vote");
                            continue;
                        };
                        if h > superblock - params.voting_cutoff {
                            let err = GovernanceError::StaleByCutoff(superblock);
                            debug!(%err, height = h, "dropping vote");
                            continue;
                        }
                    }
                    if !binds_to_input(tx, &vote) {
                        let err = GovernanceError::VinBindingFailure;
                        debug!(%err, utxo = ?vote.utxo(), "dropping vote");
                        continue;
                    }
                    match votes.entry(vote.hash()) {
                        Entry::Occupied(mut entry) => {
                            if vote.sig_hash() > entry.get().sig_hash() {
                                entry.insert(vote);
                            }
                        }
                        Entry::Vacant(entry) => {
                            entry.insert(vote);
                        }
                    }
                }
                None => {}
            }
        }
    }

    BlockData {
        proposals: proposals.into_values().collect(),
        votes: votes.into_values().collect(),
    }
}

/// A vote is accepted only if some input of the carrying transaction pushes
/// a public key whose key id equals the vote's recovered signer. This
/// proves the vote was authored by a signer of the transaction.
fn binds_to_input(tx: &Transaction, vote: &Vote) -> bool {
    let Some(signer) = vote.voter_key_id() else {
        return false;
    };
    tx.inputs.iter().any(|input| {
        input
            .script_sig
            .pushed_pubkey()
            .and_then(pubkey_from_slice)
            .is_some_and(|pubkey| key_id(&pubkey) == signer)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Coin;
    use crate::vote::VoteType;
    use crate::wire::NETWORK_VERSION;
    use obol_crypto::{encode_address, public_from_private};
    use obol_types::{Amount, KeyId, PrivateKey, Script, TxIn, TxOut};

    struct MapUtxos(HashMap<OutPoint, Coin>);

    impl UtxoView for MapUtxos {
        fn coin(&self, outpoint: &OutPoint) -> Option<Coin> {
            self.0.get(outpoint).cloned()
        }

        fn is_spent(&self, outpoint: &OutPoint, _include_mempool: bool) -> bool {
            !self.0.contains_key(outpoint)
        }
    }

    fn voter_key() -> (PrivateKey, KeyId) {
        let key = PrivateKey([0x61; 32]);
        let pubkey = public_from_private(&key).unwrap();
        (key, key_id(&pubkey))
    }

    fn sample_proposal() -> Proposal {
        Proposal::new(
            "alpha",
            144,
            Amount::new(500),
            encode_address(&KeyId::new([0x11; 20])),
            "",
            "",
        )
    }

    fn funding_outpoint() -> OutPoint {
        OutPoint::new(Hash256::new([0xf0; 32]), 0)
    }

    fn utxos_with_voting_coin(value: i64) -> MapUtxos {
        let (_, keyid) = voter_key();
        let mut map = HashMap::new();
        map.insert(
            funding_outpoint(),
            Coin {
                value: Amount::new(value),
                script_pubkey: Script::p2pkh(&keyid),
            },
        );
        MapUtxos(map)
    }

    fn vote_tx(vote: &Vote) -> Transaction {
        let (key, _) = voter_key();
        let pubkey = public_from_private(&key).unwrap();
        let mut script_sig = Script::default();
        script_sig.push_slice(&[0x30; 71]);
        script_sig.push_slice(pubkey.as_bytes());
        Transaction::new(
            vec![TxIn::new(OutPoint::new(Hash256::new([0xee; 32]), 1), script_sig)],
            vec![TxOut::new(Amount::ZERO, Script::op_return(&vote.encode()))],
        )
    }

    fn signed_vote(proposal: Hash256, vote_type: VoteType) -> Vote {
        let (key, _) = voter_key();
        let mut vote = Vote::new(proposal, vote_type, funding_outpoint());
        assert!(vote.sign(&key));
        vote
    }

    #[test]
    fn extracts_proposal_and_vote() {
        let params = ConsensusParams::regtest();
        let utxos = utxos_with_voting_coin(250);
        let proposal = sample_proposal();
        let vote = signed_vote(proposal.hash(), VoteType::Yes);

        let proposal_tx = Transaction::new(
            vec![TxIn::new(OutPoint::new(Hash256::new([0xcc; 32]), 0), Script::default())],
            vec![TxOut::new(
                params.proposal_fee,
                Script::op_return(&proposal.encode()),
            )],
        );
        let block = Block::new(1_000, vec![proposal_tx, vote_tx(&vote)]);

        let data = data_from_block(&block, Some(10), &params, &utxos, true, &|_| None);
        assert_eq!(data.proposals.len(), 1);
        assert_eq!(data.votes.len(), 1);
        assert_eq!(data.votes[0].amount(), Amount::new(250));
        assert_eq!(data.votes[0].block_number(), 10);
        assert_eq!(data.votes[0].time(), 1_000);
    }

    #[test]
    fn coinbase_outputs_are_ignored() {
        let params = ConsensusParams::regtest();
        let utxos = utxos_with_voting_coin(250);
        let proposal = sample_proposal();
        let mut tx = Transaction::new(
            vec![TxIn::new(OutPoint::NULL, Script::default())],
            vec![TxOut::new(Amount::ZERO, Script::op_return(&proposal.encode()))],
        );
        assert!(tx.is_coinbase());
        tx.lock_time = 0;
        let block = Block::new(1_000, vec![tx]);
        let data = data_from_block(&block, Some(10), &params, &utxos, true, &|_| None);
        assert!(data.proposals.is_empty());
    }

    #[test]
    fn vote_without_matching_input_key_dropped() {
        let params = ConsensusParams::regtest();
        let utxos = utxos_with_voting_coin(250);
        let proposal = sample_proposal();
        let vote = signed_vote(proposal.hash(), VoteType::Yes);

        // Carrier transaction whose input pushes an unrelated key.
        let other = PrivateKey([0x71; 32]);
        let other_pub = public_from_private(&other).unwrap();
        let mut script_sig = Script::default();
        script_sig.push_slice(other_pub.as_bytes());
        let tx = Transaction::new(
            vec![TxIn::new(OutPoint::new(Hash256::new([0xee; 32]), 1), script_sig)],
            vec![TxOut::new(Amount::ZERO, Script::op_return(&vote.encode()))],
        );
        let block = Block::new(1_000, vec![tx]);

        let sb = proposal.superblock();
        let data = data_from_block(&block, Some(10), &params, &utxos, true, &|_| Some(sb));
        assert!(data.votes.is_empty());
    }

    #[test]
    fn vote_for_unknown_proposal_dropped_when_height_known() {
        let params = ConsensusParams::regtest();
        let utxos = utxos_with_voting_coin(250);
        let vote = signed_vote(Hash256::new([0xab; 32]), VoteType::Yes);
        let block = Block::new(1_000, vec![vote_tx(&vote)]);

        let data = data_from_block(&block, Some(10), &params, &utxos, true, &|_| None);
        assert!(data.votes.is_empty());

        // Without a height (disconnect path) the same vote extracts.
        let data = data_from_block(&block, None, &params, &utxos, true, &|_| None);
        assert_eq!(data.votes.len(), 1);
    }

    #[test]
    fn same_block_conflict_keeps_larger_sig_hash() {
        let params = ConsensusParams::regtest();
        let utxos = utxos_with_voting_coin(250);
        let proposal = sample_proposal();
        let yes = signed_vote(proposal.hash(), VoteType::Yes);
        let no = signed_vote(proposal.hash(), VoteType::No);
        assert_eq!(yes.hash(), no.hash());
        let winner = if yes.sig_hash() > no.sig_hash() {
            yes.vote()
        } else {
            no.vote()
        };

        let sb = proposal.superblock();
        for order in [vec![&yes, &no], vec![&no, &yes]] {
            let txs = order.iter().map(|v| vote_tx(v)).collect();
            let block = Block::new(1_000, txs);
            let data = data_from_block(&block, Some(10), &params, &utxos, true, &|_| Some(sb));
            assert_eq!(data.votes.len(), 1);
            assert_eq!(data.votes[0].vote(), winner);
        }
    }

    #[test]
    fn undersized_utxo_dropped() {
        let params = ConsensusParams::regtest();
        let utxos = utxos_with_voting_coin(9); // below vote_min_utxo_amount = 10
        let proposal = sample_proposal();
        let vote = signed_vote(proposal.hash(), VoteType::Yes);
        let block = Block::new(1_000, vec![vote_tx(&vote)]);
        let sb = proposal.superblock();
        let data = data_from_block(&block, Some(10), &params, &utxos, true, &|_| Some(sb));
        assert!(data.votes.is_empty());
    }

    #[test]
    fn garbage_payloads_are_skipped_silently() {
        let params = ConsensusParams::regtest();
        let utxos = MapUtxos(HashMap::new());
        let tx = Transaction::new(
            vec![TxIn::new(OutPoint::new(Hash256::new([1; 32]), 0), Script::default())],
            vec![
                TxOut::new(Amount::ZERO, Script::op_return(&[NETWORK_VERSION, 1, 0xff])),
                TxOut::new(Amount::ZERO, Script::op_return(b"unrelated data")),
            ],
        );
        let block = Block::new(1_000, vec![tx]);
        let data = data_from_block(&block, Some(10), &params, &utxos, true, &|_| None);
        assert!(data.proposals.is_empty());
        assert!(data.votes.is_empty());
    }
}
