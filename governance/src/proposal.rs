//! Spending proposals.
//!
//! A proposal asks the network to pay `amount` to `address` out of the
//! subsidy of a scheduled superblock. Proposals are immutable once
//! broadcast and content-addressed: the hash covers every wire field, so
//! re-mining the same proposal is idempotent.

use crate::error::GovernanceError;
use crate::wire::{ObjectKind, NETWORK_VERSION};
use obol_crypto::{decode_address, sha256d};
use obol_types::{
    Amount, ConsensusParams, DecodeError, Decoder, Encoder, Hash256, MAX_OP_RETURN_RELAY,
};
use regex::Regex;
use std::sync::OnceLock;

/// Proposal names: word characters with interior dashes and spaces.
fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\w+[\w\- ]*\w+$").expect("static regex"))
}

/// A governance spending proposal.
#[derive(Clone, Debug)]
pub struct Proposal {
    version: u8,
    superblock: i32,
    amount: Amount,
    address: String,
    name: String,
    url: String,
    description: String,
    /// Height of the block this proposal was mined in. Memory only, never
    /// on the wire.
    block_number: i32,
}

impl Proposal {
    pub fn new(
        name: impl Into<String>,
        superblock: i32,
        amount: Amount,
        address: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            version: NETWORK_VERSION,
            superblock,
            amount,
            address: address.into(),
            name: name.into(),
            url: url.into(),
            description: description.into(),
            block_number: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superblock(&self) -> i32 {
        self.superblock
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn block_number(&self) -> i32 {
        self.block_number
    }

    pub(crate) fn set_block_number(&mut self, height: i32) {
        self.block_number = height;
    }

    /// Content digest over the canonical serialization. Proposals are
    /// identified by this hash everywhere.
    pub fn hash(&self) -> Hash256 {
        sha256d(&self.encode())
    }

    /// Canonical wire serialization.
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.write_u8(self.version);
        enc.write_u8(ObjectKind::Proposal as u8);
        enc.write_i32_le(self.superblock);
        enc.write_i64_le(self.amount.raw());
        enc.write_var_str(&self.address);
        enc.write_var_str(&self.name);
        enc.write_var_str(&self.url);
        enc.write_var_str(&self.description);
        enc.into_bytes()
    }

    /// Strict decode: trailing bytes invalidate the payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut dec = Decoder::new(bytes);
        let version = dec.read_u8()?;
        if dec.read_u8()? != ObjectKind::Proposal as u8 {
            return Err(DecodeError::InvalidValue("object kind"));
        }
        let proposal = Self {
            version,
            superblock: dec.read_i32_le()?,
            amount: Amount::new(dec.read_i64_le()?),
            address: dec.read_var_str()?,
            name: dec.read_var_str()?,
            url: dec.read_var_str()?,
            description: dec.read_var_str()?,
            block_number: 0,
        };
        dec.finish()?;
        Ok(proposal)
    }

    /// Structural and semantic validity.
    pub fn validate(&self, params: &ConsensusParams) -> Result<(), GovernanceError> {
        if self.version != NETWORK_VERSION {
            return Err(GovernanceError::InvalidProposal(format!(
                "bad network version, expected {}",
                NETWORK_VERSION
            )));
        }
        if !name_regex().is_match(&self.name) {
            return Err(GovernanceError::InvalidProposal(format!(
                "name {:?} is invalid, only alphanumeric characters are accepted",
                self.name
            )));
        }
        if self.superblock <= 0 || self.superblock % params.superblock != 0 {
            return Err(GovernanceError::InvalidProposal(format!(
                "bad superblock number, must be a positive multiple of {}",
                params.superblock
            )));
        }
        let subsidy = (params.block_subsidy)(self.superblock);
        if self.amount < params.proposal_min_amount || self.amount > subsidy {
            return Err(GovernanceError::InvalidProposal(format!(
                "bad amount, specify between {} and {}",
                params.proposal_min_amount, params.proposal_max_amount
            )));
        }
        if decode_address(&self.address).is_none() {
            return Err(GovernanceError::InvalidProposal(format!(
                "bad payment address {}",
                self.address
            )));
        }
        let max_bytes = MAX_OP_RETURN_RELAY - 3; // OP_RETURN + pushdata opcodes
        let size = self.encode().len();
        if size > max_bytes {
            return Err(GovernanceError::InvalidProposal(format!(
                "data is too long, try reducing the description by {} characters",
                size - max_bytes
            )));
        }
        Ok(())
    }

    /// Whether this proposal may still be mined at `height`.
    pub fn meets_cutoff(&self, height: i32, params: &ConsensusParams) -> bool {
        // Proposals can be submitted multiple superblocks in advance, so any
        // height up to the cutoff window qualifies.
        height <= self.superblock - params.proposal_cutoff
    }
}

impl PartialEq for Proposal {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Proposal {}
