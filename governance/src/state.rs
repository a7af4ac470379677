//! The in-memory governance state and its chain-event handlers.
//!
//! Two maps keyed by object hash, guarded by one mutex. Every mutation,
//! whether merging a connected block, pruning spent votes, or unwinding a
//! disconnect, runs in a single critical section so readers always observe
//! a consistent snapshot. Queries hand out copies; callers never hold
//! references into the store.

use crate::chain::{ChainListener, UtxoView};
use crate::extract::data_from_block;
use crate::proposal::Proposal;
use crate::vote::Vote;
use obol_types::{Block, ConsensusParams, Hash256, OutPoint};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Default)]
struct State {
    proposals: HashMap<Hash256, Proposal>,
    votes: HashMap<Hash256, Vote>,
}

/// The governance state engine.
///
/// Constructed once by the embedding node with a handle to its utxo view;
/// tests instantiate isolated engines with in-memory views.
pub struct Governance {
    params: ConsensusParams,
    utxos: Arc<dyn UtxoView>,
    inner: Mutex<State>,
}

impl Governance {
    pub fn new(params: ConsensusParams, utxos: Arc<dyn UtxoView>) -> Self {
        Self {
            params,
            utxos,
            inner: Mutex::new(State::default()),
        }
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    pub(crate) fn utxos(&self) -> &dyn UtxoView {
        self.utxos.as_ref()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn has_proposal(&self, hash: &Hash256) -> bool {
        self.state().proposals.contains_key(hash)
    }

    pub fn has_vote(&self, hash: &Hash256) -> bool {
        self.state().votes.contains_key(hash)
    }

    /// Whether some stored vote pairs `proposal` with `utxo`.
    pub fn has_vote_for(&self, proposal: &Hash256, utxo: &OutPoint) -> bool {
        self.state()
            .votes
            .values()
            .any(|v| v.utxo() == *utxo && v.proposal() == *proposal)
    }

    pub fn proposal(&self, hash: &Hash256) -> Option<Proposal> {
        self.state().proposals.get(hash).cloned()
    }

    pub fn vote(&self, hash: &Hash256) -> Option<Vote> {
        self.state().votes.get(hash).cloned()
    }

    pub fn proposals(&self) -> Vec<Proposal> {
        self.state().proposals.values().cloned().collect()
    }

    pub fn votes(&self) -> Vec<Vote> {
        self.state().votes.values().cloned().collect()
    }

    /// All votes referencing `proposal`.
    pub fn votes_for(&self, proposal: &Hash256) -> Vec<Vote> {
        self.state()
            .votes
            .values()
            .filter(|v| v.proposal() == *proposal)
            .cloned()
            .collect()
    }

    /// Proposals and votes mined at or after `height`.
    pub fn proposals_since(&self, height: i32) -> (Vec<Proposal>, Vec<Vote>) {
        let state = self.state();
        let proposals = state
            .proposals
            .values()
            .filter(|p| p.block_number() >= height)
            .cloned()
            .collect();
        let votes = state
            .votes
            .values()
            .filter(|v| v.block_number() >= height)
            .cloned()
            .collect();
        (proposals, votes)
    }

    /// Clears all governance state, e.g. ahead of a reindex.
    pub fn reset(&self) {
        let mut state = self.state();
        state.proposals.clear();
        state.votes.clear();
    }

    pub(crate) fn remove_vote(&self, hash: &Hash256) {
        self.state().votes.remove(hash);
    }

    // ── Chain transitions ──────────────────────────────────────────────

    /// Merges a connected block into the state.
    ///
    /// Live connects keep the mempool spent-check on; the bootstrap loader
    /// disables it because historical replay may run before the mempool
    /// exists. The merge is commutative under the time/sig-hash preference,
    /// which is what makes the loader's out-of-order delivery safe.
    pub fn connect_block(&self, block: &Block, height: i32, mempool_check: bool) {
        let mut state = self.state();
        let data = {
            let known = &state.proposals;
            data_from_block(
                block,
                Some(height),
                &self.params,
                self.utxos.as_ref(),
                mempool_check,
                &|hash| known.get(hash).map(Proposal::superblock),
            )
        };

        for proposal in data.proposals {
            state.proposals.insert(proposal.hash(), proposal);
        }

        for vote in data.votes {
            if !state.proposals.contains_key(&vote.proposal()) {
                debug!(proposal = %vote.proposal(), "skipping vote without stored proposal");
                continue;
            }
            // A later vote supersedes an earlier one on the same
            // (proposal, utxo); within one block time the larger sig hash
            // wins deterministically.
            match state.votes.entry(vote.hash()) {
                Entry::Occupied(mut entry) => {
                    let existing = entry.get();
                    if vote.time() > existing.time()
                        || (vote.time() == existing.time()
                            && vote.sig_hash() > existing.sig_hash())
                    {
                        entry.insert(vote);
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(vote);
                }
            }
        }

        // Any vote whose backing utxo was consumed by this block dies with
        // the block that spent it.
        let spent: HashSet<OutPoint> = block
            .txs
            .iter()
            .flat_map(|tx| tx.inputs.iter().map(|input| input.prevout))
            .collect();
        state.votes.retain(|_, vote| !spent.contains(&vote.utxo()));
    }

    /// Unwinds a disconnected block: every object it introduced is removed
    /// by hash. Cutoff checks are skipped because these objects were
    /// already accepted when the block connected. Votes removed earlier because a
    /// later block spent their utxo come back when that later block's
    /// replay reconnects them.
    pub fn disconnect_block(&self, block: &Block) {
        let mut state = self.state();
        let data = data_from_block(
            block,
            None,
            &self.params,
            self.utxos.as_ref(),
            true,
            &|_| None,
        );
        for proposal in &data.proposals {
            state.proposals.remove(&proposal.hash());
        }
        for vote in &data.votes {
            state.votes.remove(&vote.hash());
        }
    }
}

impl ChainListener for Governance {
    fn on_block_connected(&self, block: &Block, height: i32) {
        self.connect_block(block, height, true);
    }

    fn on_block_disconnected(&self, block: &Block) {
        self.disconnect_block(block);
    }
}
