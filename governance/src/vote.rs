//! Votes.
//!
//! A vote binds an unspent output to a proposal: the output's value is the
//! vote's weight and its controlling key signs the vote. The identifying
//! `hash` deliberately excludes the vote selector so a changed vote lands on
//! the same entry; `sig_hash` includes it and doubles as the deterministic
//! tie-breaker between simultaneous changes.

use crate::chain::UtxoView;
use crate::error::GovernanceError;
use crate::wire::{ObjectKind, NETWORK_VERSION};
use obol_crypto::{key_id, recover_compact, sha256d, sign_compact};
use obol_types::{
    Amount, ConsensusParams, DecodeError, Decoder, Encoder, Hash256, KeyId, OutPoint, PrivateKey,
    PublicKey, Signature,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// The three vote selectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VoteType {
    No = 0,
    Yes = 1,
    Abstain = 2,
}

impl VoteType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::No),
            1 => Some(Self::Yes),
            2 => Some(Self::Abstain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Yes => "yes",
            Self::Abstain => "abstain",
        }
    }
}

impl FromStr for VoteType {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "no" => Ok(Self::No),
            "yes" => Ok(Self::Yes),
            "abstain" => Ok(Self::Abstain),
            other => Err(GovernanceError::InvalidVote(format!(
                "unknown vote type {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vote on a proposal, weighted by the unspent output it references.
#[derive(Clone, Debug)]
pub struct Vote {
    version: u8,
    proposal: Hash256,
    vote: VoteType,
    utxo: OutPoint,
    signature: Signature,

    // Memory-only fields, populated from chain context rather than the wire.
    /// The OP_RETURN output carrying this vote (not the voting utxo).
    outpoint: OutPoint,
    /// Block time of the containing block.
    time: i64,
    /// Height of the containing block.
    block_number: i32,
    /// Value of the voting utxo.
    amount: Amount,
    /// Key id locked by the voting utxo's script.
    key_id: Option<KeyId>,
    /// Public key recovered from the signature, memoized on first access.
    pubkey: OnceLock<Option<PublicKey>>,
}

impl Vote {
    /// An unsigned vote; call [`Vote::sign`] before broadcasting.
    pub fn new(proposal: Hash256, vote: VoteType, utxo: OutPoint) -> Self {
        Self {
            version: NETWORK_VERSION,
            proposal,
            vote,
            utxo,
            signature: Signature::new([0u8; 65]),
            outpoint: OutPoint::NULL,
            time: 0,
            block_number: 0,
            amount: Amount::ZERO,
            key_id: None,
            pubkey: OnceLock::new(),
        }
    }

    pub fn proposal(&self) -> Hash256 {
        self.proposal
    }

    pub fn vote(&self) -> VoteType {
        self.vote
    }

    pub fn utxo(&self) -> OutPoint {
        self.utxo
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Location of the OP_RETURN output this vote was mined in.
    pub fn outpoint(&self) -> OutPoint {
        self.outpoint
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn block_number(&self) -> i32 {
        self.block_number
    }

    /// Value of the voting utxo, loaded from the utxo set.
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Key id derived from the voting utxo's locking script.
    pub fn key_id(&self) -> Option<KeyId> {
        self.key_id
    }

    /// Identifying digest. Excludes the vote selector so a changed vote
    /// supersedes the previous entry for the same `(proposal, utxo)`.
    pub fn hash(&self) -> Hash256 {
        let mut enc = Encoder::new();
        enc.write_u8(self.version);
        enc.write_u8(ObjectKind::Vote as u8);
        enc.write_hash(&self.proposal);
        self.utxo.encode_into(&mut enc);
        sha256d(enc.as_bytes())
    }

    /// Signature digest. Includes the vote selector; also the tie-breaker
    /// between conflicting votes with equal block time.
    pub fn sig_hash(&self) -> Hash256 {
        let mut enc = Encoder::new();
        enc.write_u8(self.version);
        enc.write_u8(ObjectKind::Vote as u8);
        enc.write_hash(&self.proposal);
        enc.write_u8(self.vote as u8);
        self.utxo.encode_into(&mut enc);
        sha256d(enc.as_bytes())
    }

    /// Canonical wire serialization.
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.write_u8(self.version);
        enc.write_u8(ObjectKind::Vote as u8);
        enc.write_hash(&self.proposal);
        enc.write_u8(self.vote as u8);
        self.utxo.encode_into(&mut enc);
        enc.write_var_bytes(self.signature.as_bytes());
        enc.into_bytes()
    }

    /// Strict decode. `outpoint`, `time` and `block_number` come from the
    /// containing transaction and block; the signature is not recovered
    /// here; recovery is lazy and memoized.
    pub fn decode(
        bytes: &[u8],
        outpoint: OutPoint,
        time: i64,
        block_number: i32,
    ) -> Result<Self, DecodeError> {
        let mut dec = Decoder::new(bytes);
        let version = dec.read_u8()?;
        if dec.read_u8()? != ObjectKind::Vote as u8 {
            return Err(DecodeError::InvalidValue("object kind"));
        }
        let proposal = dec.read_hash()?;
        let vote =
            VoteType::from_u8(dec.read_u8()?).ok_or(DecodeError::InvalidValue("vote type"))?;
        let utxo = OutPoint::decode_from(&mut dec)?;
        let sig = dec.read_var_bytes()?;
        let signature = Signature::new(
            sig.as_slice()
                .try_into()
                .map_err(|_| DecodeError::InvalidValue("signature length"))?,
        );
        dec.finish()?;
        Ok(Self {
            version,
            proposal,
            vote,
            utxo,
            signature,
            outpoint,
            time,
            block_number,
            amount: Amount::ZERO,
            key_id: None,
            pubkey: OnceLock::new(),
        })
    }

    /// Signs `sig_hash` with the utxo's controlling key and checks that the
    /// signature recovers.
    pub fn sign(&mut self, key: &PrivateKey) -> bool {
        self.pubkey = OnceLock::new();
        match sign_compact(&self.sig_hash(), key) {
            Some(signature) => {
                self.signature = signature;
                self.recovered_pubkey().is_some()
            }
            None => false,
        }
    }

    /// The public key recovered from the signature, memoized.
    pub fn recovered_pubkey(&self) -> Option<PublicKey> {
        *self
            .pubkey
            .get_or_init(|| recover_compact(&self.sig_hash(), &self.signature))
    }

    /// Key id of the recovered signer.
    pub fn voter_key_id(&self) -> Option<KeyId> {
        self.recovered_pubkey().map(|pk| key_id(&pk))
    }

    /// Loads the utxo-derived fields (value and controlling key id) from
    /// the utxo set.
    pub fn load_utxo_meta(&mut self, utxos: &dyn UtxoView) {
        if let Some(coin) = utxos.coin(&self.utxo) {
            self.amount = coin.value;
            self.key_id = coin.script_pubkey.p2pkh_key_id();
        }
    }

    /// Full validity: structure, weight floor, key binding, and spentness.
    /// Call [`Vote::load_utxo_meta`] first.
    pub fn validate(
        &self,
        params: &ConsensusParams,
        utxos: &dyn UtxoView,
        mempool_check: bool,
    ) -> Result<(), GovernanceError> {
        if self.version != NETWORK_VERSION {
            return Err(GovernanceError::InvalidVote(format!(
                "bad network version, expected {}",
                NETWORK_VERSION
            )));
        }
        if self.amount < params.vote_min_utxo_amount {
            return Err(GovernanceError::InvalidVote(format!(
                "utxo value {} is below the voting minimum {}",
                self.amount, params.vote_min_utxo_amount
            )));
        }
        let Some(keyid) = self.key_id else {
            return Err(GovernanceError::InvalidVote(
                "utxo is not pay-to-pubkey-hash".into(),
            ));
        };
        let Some(signer) = self.voter_key_id() else {
            return Err(GovernanceError::InvalidVote(
                "signature recovery failed".into(),
            ));
        };
        if signer != keyid {
            return Err(GovernanceError::InvalidVote(
                "signer does not control the voting utxo".into(),
            ));
        }
        if utxos.is_spent(&self.utxo, mempool_check) {
            return Err(GovernanceError::UtxoSpent);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_test_amount(&mut self, amount: Amount) {
        self.amount = amount;
    }
}

/// Equality covers the wire fields only; chain context does not change a
/// vote's identity.
impl PartialEq for Vote {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.proposal == other.proposal
            && self.vote == other.vote
            && self.utxo == other.utxo
            && self.signature == other.signature
    }
}

impl Eq for Vote {}

#[cfg(test)]
mod tests {
    use super::*;

    fn outpoint(fill: u8, vout: u32) -> OutPoint {
        OutPoint::new(Hash256::new([fill; 32]), vout)
    }

    fn signed_vote(vote: VoteType) -> Vote {
        let mut v = Vote::new(Hash256::new([0xaa; 32]), vote, outpoint(1, 0));
        assert!(v.sign(&PrivateKey([0x51; 32])));
        v
    }

    #[test]
    fn vote_type_strings() {
        assert_eq!("YES".parse::<VoteType>().unwrap(), VoteType::Yes);
        assert_eq!("no".parse::<VoteType>().unwrap(), VoteType::No);
        assert_eq!("abstain".parse::<VoteType>().unwrap(), VoteType::Abstain);
        assert!("maybe".parse::<VoteType>().is_err());
        assert_eq!(VoteType::Yes.to_string(), "yes");
    }

    #[test]
    fn encode_decode_roundtrip() {
        let vote = signed_vote(VoteType::Yes);
        let decoded = Vote::decode(&vote.encode(), OutPoint::NULL, 0, 0).unwrap();
        assert_eq!(decoded, vote);
        assert_eq!(decoded.hash(), vote.hash());
        assert_eq!(decoded.sig_hash(), vote.sig_hash());
    }

    #[test]
    fn hash_ignores_vote_selector() {
        let yes = signed_vote(VoteType::Yes);
        let no = signed_vote(VoteType::No);
        assert_eq!(yes.hash(), no.hash());
        assert_ne!(yes.sig_hash(), no.sig_hash());
    }

    #[test]
    fn recovery_matches_signing_key() {
        let key = PrivateKey([0x51; 32]);
        let vote = signed_vote(VoteType::Abstain);
        let expected = obol_crypto::public_from_private(&key).unwrap();
        assert_eq!(vote.recovered_pubkey(), Some(expected));
        assert_eq!(vote.voter_key_id(), Some(key_id(&expected)));
    }

    #[test]
    fn tampered_signature_recovers_different_key() {
        let vote = signed_vote(VoteType::Yes);
        let good = vote.voter_key_id();
        let mut bytes = vote.encode();
        let len = bytes.len();
        bytes[len - 10] ^= 0x01;
        let tampered = Vote::decode(&bytes, OutPoint::NULL, 0, 0).unwrap();
        assert_ne!(tampered.voter_key_id(), good);
    }

    #[test]
    fn decode_rejects_bad_vote_type() {
        let vote = signed_vote(VoteType::Yes);
        let mut bytes = vote.encode();
        bytes[34] = 9; // vote selector offset: 1 + 1 + 32
        assert_eq!(
            Vote::decode(&bytes, OutPoint::NULL, 0, 0),
            Err(DecodeError::InvalidValue("vote type"))
        );
    }

    #[test]
    fn decode_rejects_short_signature() {
        let mut enc = Encoder::new();
        enc.write_u8(NETWORK_VERSION);
        enc.write_u8(ObjectKind::Vote as u8);
        enc.write_hash(&Hash256::new([1; 32]));
        enc.write_u8(1);
        outpoint(2, 0).encode_into(&mut enc);
        enc.write_var_bytes(&[0u8; 64]);
        assert_eq!(
            Vote::decode(&enc.into_bytes(), OutPoint::NULL, 0, 0),
            Err(DecodeError::InvalidValue("signature length"))
        );
    }
}
