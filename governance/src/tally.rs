//! The sybil-resistant tally.
//!
//! A naive sum over all votes would let one user multiply their weight by
//! spreading coin across many utxos. Votes are therefore clustered into
//! identities: votes whose utxos were created by the same funding
//! transaction are assumed co-authored, and votes recovered to the same
//! key are the same destination. Each collapsed identity contributes
//! exactly one vote (its largest-backed member), so linking utxos never
//! increases weight. Users who keep their utxos unlinked are counted as
//! independent identities; that is the documented client-side best
//! practice, not a protocol bug.

use crate::vote::{Vote, VoteType};
use obol_types::{Amount, ConsensusParams, Hash256, KeyId};
use std::collections::{BTreeMap, HashSet};

/// Vote totals for one proposal. The `c*` fields are summed coin amounts;
/// the integer counts are the amounts divided by the consensus
/// `vote_balance`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub yes: i64,
    pub no: i64,
    pub abstain: i64,
    pub cyes: Amount,
    pub cno: Amount,
    pub cabstain: Amount,
}

impl Tally {
    fn absorb(&mut self, other: &Tally) {
        self.yes += other.yes;
        self.no += other.no;
        self.abstain += other.abstain;
        self.cyes += other.cyes;
        self.cno += other.cno;
        self.cabstain += other.cabstain;
    }
}

/// Tallies `votes` for `proposal` under identity grouping.
pub fn tally(proposal: &Hash256, votes: &[Vote], params: &ConsensusParams) -> Tally {
    let proposal_votes: Vec<&Vote> = votes
        .iter()
        .filter(|v| v.proposal() == *proposal)
        .collect();

    // Votes whose utxos share an originating transaction are assumed to
    // share an author; votes recovered to the same key id certainly do.
    // BTreeMaps keep the grouping iteration deterministic.
    let mut by_funding: BTreeMap<Hash256, Vec<&Vote>> = BTreeMap::new();
    let mut by_key: BTreeMap<KeyId, Vec<&Vote>> = BTreeMap::new();
    for &vote in &proposal_votes {
        by_funding.entry(vote.utxo().txid).or_default().push(vote);
        if let Some(keyid) = vote.voter_key_id() {
            by_key.entry(keyid).or_default().push(vote);
        }
    }

    let mut counted: HashSet<Hash256> = HashSet::new();
    let mut total = Tally::default();

    for bucket in by_funding.values() {
        // Expand the funding bucket with every vote sharing a key with a
        // member, forming the identity set.
        let mut identity: BTreeMap<Hash256, &Vote> = BTreeMap::new();
        for &vote in bucket {
            identity.insert(vote.hash(), vote);
        }
        for &vote in bucket {
            if let Some(keyid) = vote.voter_key_id() {
                for &linked in &by_key[&keyid] {
                    identity.insert(linked.hash(), linked);
                }
            }
        }

        // Votes already absorbed into an earlier overlapping identity
        // never count twice.
        identity.retain(|hash, _| !counted.contains(hash));
        if identity.is_empty() {
            continue;
        }
        counted.extend(identity.keys().copied());

        // One counted vote per identity: the largest-backed member, ties
        // broken by the larger sig hash.
        let Some(counted_vote) = identity.values().max_by_key(|v| (v.amount(), v.sig_hash()))
        else {
            continue;
        };

        let mut sub = Tally::default();
        match counted_vote.vote() {
            VoteType::Yes => sub.cyes = counted_vote.amount(),
            VoteType::No => sub.cno = counted_vote.amount(),
            VoteType::Abstain => sub.cabstain = counted_vote.amount(),
        }
        sub.yes = sub.cyes.raw() / params.vote_balance.raw();
        sub.no = sub.cno.raw() / params.vote_balance.raw();
        sub.abstain = sub.cabstain.raw() / params.vote_balance.raw();
        total.absorb(&sub);
    }

    total
}
