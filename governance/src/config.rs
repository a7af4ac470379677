//! Governance configuration knobs.

use obol_types::Amount;
use serde::{Deserialize, Serialize};

/// Default value targeted for the vote-funding input: 0.1 coin.
pub const DEFAULT_VOTE_INPUT_AMOUNT: i64 = 10_000_000;

/// Node-operator configuration for the governance transaction builder.
///
/// Deserialized from the node's config file; every field has a default.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Target value for the input coin that funds voting transactions.
    /// Coins close to this value are reserved as inputs, leaving larger
    /// coins free to vote.
    #[serde(default = "default_vote_input_amount")]
    pub vote_input_amount: Amount,

    /// If set, proposal fees are paid exclusively from this address.
    #[serde(default)]
    pub proposal_address: Option<String>,
}

fn default_vote_input_amount() -> Amount {
    Amount::new(DEFAULT_VOTE_INPUT_AMOUNT)
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            vote_input_amount: default_vote_input_amount(),
            proposal_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied() {
        let config = GovernanceConfig::default();
        assert_eq!(config.vote_input_amount, Amount::new(10_000_000));
        assert!(config.proposal_address.is_none());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: GovernanceConfig = toml::from_str("").unwrap();
        assert_eq!(config.vote_input_amount, Amount::new(10_000_000));
        assert!(config.proposal_address.is_none());

        let config: GovernanceConfig = toml::from_str(
            "vote_input_amount = 20000000\nproposal_address = \"B6z\"",
        )
        .unwrap();
        assert_eq!(config.vote_input_amount, Amount::new(20_000_000));
        assert_eq!(config.proposal_address.as_deref(), Some("B6z"));
    }
}
