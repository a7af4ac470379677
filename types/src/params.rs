//! Consensus parameters for the governance subsystem.

use crate::amount::{Amount, COIN};

/// Maximum OP_RETURN payload size relayed by the network, in bytes.
pub const MAX_OP_RETURN_RELAY: usize = 1024;

/// Maximum number of OP_RETURN outputs allowed in a single transaction.
pub const MAX_OP_RETURN_IN_TRANSACTION: usize = 50;

/// Block subsidy schedule, supplied by the embedding node.
pub type SubsidyFn = fn(i32) -> Amount;

/// Consensus parameters read by the governance engine.
#[derive(Clone, Debug)]
pub struct ConsensusParams {
    /// Superblock interval in blocks. Governance payouts are scheduled at
    /// heights that are multiples of this.
    pub superblock: i32,
    /// Height at which the governance system activates.
    pub governance_block: i32,
    /// Fee burned into the OP_RETURN output of a proposal submission.
    pub proposal_fee: Amount,
    /// Smallest amount a proposal may request.
    pub proposal_min_amount: Amount,
    /// Largest amount a proposal may request.
    pub proposal_max_amount: Amount,
    /// Blocks before the superblock after which new proposals are rejected.
    pub proposal_cutoff: i32,
    /// Blocks before the superblock after which new votes are rejected.
    pub voting_cutoff: i32,
    /// Smallest utxo value that may back a vote.
    pub vote_min_utxo_amount: Amount,
    /// Minor units of coin per unit of integer vote weight.
    pub vote_balance: Amount,
    /// Block subsidy at a given height; bounds proposal amounts.
    pub block_subsidy: SubsidyFn,
}

impl ConsensusParams {
    /// Production network parameters.
    pub fn mainnet() -> Self {
        Self {
            superblock: 43_200,
            governance_block: 518_400,
            proposal_fee: Amount::from_coin(10),
            proposal_min_amount: Amount::from_coin(10),
            proposal_max_amount: Amount::from_coin(40_000),
            proposal_cutoff: 2_880,
            voting_cutoff: 60,
            vote_min_utxo_amount: Amount::new(COIN / 10),
            vote_balance: Amount::from_coin(5_000),
            block_subsidy: mainnet_subsidy,
        }
    }

    /// Small parameters for local regression testing.
    pub fn regtest() -> Self {
        Self {
            superblock: 144,
            governance_block: 1,
            proposal_fee: Amount::new(10),
            proposal_min_amount: Amount::new(10),
            proposal_max_amount: Amount::new(1_000),
            proposal_cutoff: 10,
            voting_cutoff: 2,
            vote_min_utxo_amount: Amount::new(10),
            vote_balance: Amount::new(100),
            block_subsidy: |_| Amount::new(1_000),
        }
    }

    /// The first superblock strictly after `from`.
    pub fn next_superblock(&self, from: i32) -> i32 {
        from - from % self.superblock + self.superblock
    }

    /// The superblock at or before `from`.
    pub fn previous_superblock(&self, from: i32) -> i32 {
        self.next_superblock(from) - self.superblock
    }
}

fn mainnet_subsidy(height: i32) -> Amount {
    // Superblocks carry the governance budget on top of the base subsidy.
    if height > 0 && height % 43_200 == 0 {
        Amount::from_coin(40_000)
    } else {
        Amount::from_coin(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_superblock_rounds_up() {
        let params = ConsensusParams::regtest();
        assert_eq!(params.next_superblock(0), 144);
        assert_eq!(params.next_superblock(1), 144);
        assert_eq!(params.next_superblock(144), 288);
        assert_eq!(params.next_superblock(145), 288);
    }

    #[test]
    fn previous_superblock_rounds_down() {
        let params = ConsensusParams::regtest();
        assert_eq!(params.previous_superblock(150), 144);
        assert_eq!(params.previous_superblock(144), 144);
        assert_eq!(params.previous_superblock(143), 0);
    }

    #[test]
    fn mainnet_superblock_carries_budget() {
        let params = ConsensusParams::mainnet();
        assert_eq!((params.block_subsidy)(43_200), Amount::from_coin(40_000));
        assert_eq!((params.block_subsidy)(43_201), Amount::from_coin(1));
    }
}
