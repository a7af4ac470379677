use proptest::prelude::*;

use obol_governance::{ObjectKind, Proposal, Vote, VoteType, NETWORK_VERSION};
use obol_types::{Amount, ConsensusParams, Encoder, Hash256, OutPoint};

fn encode_vote_payload(
    proposal: [u8; 32],
    vote: u8,
    utxo_txid: [u8; 32],
    utxo_vout: u32,
    signature: &[u8],
) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.write_u8(NETWORK_VERSION);
    enc.write_u8(ObjectKind::Vote as u8);
    enc.write_hash(&Hash256::new(proposal));
    enc.write_u8(vote);
    OutPoint::new(Hash256::new(utxo_txid), utxo_vout).encode_into(&mut enc);
    enc.write_var_bytes(signature);
    enc.into_bytes()
}

proptest! {
    /// Valid proposals survive the codec byte-for-byte with a stable hash.
    #[test]
    fn proposal_roundtrip(
        name in "[a-zA-Z0-9_][a-zA-Z0-9_ \\-]{0,18}[a-zA-Z0-9_]",
        superblock in any::<i32>(),
        amount in any::<i64>(),
        address in "\\PC{0,40}",
        url in "\\PC{0,40}",
        description in "\\PC{0,120}",
    ) {
        let proposal = Proposal::new(name, superblock, Amount::new(amount), address, url, description);
        let bytes = proposal.encode();
        let decoded = Proposal::decode(&bytes).unwrap();
        prop_assert_eq!(decoded.encode(), bytes);
        prop_assert_eq!(decoded.hash(), proposal.hash());
    }

    /// Vote payloads with a 65-byte signature survive the codec
    /// byte-for-byte; anything with another signature length is rejected.
    #[test]
    fn vote_roundtrip(
        proposal in prop::array::uniform32(0u8..),
        vote in 0u8..3,
        txid in prop::array::uniform32(0u8..),
        vout in any::<u32>(),
        signature in proptest::collection::vec(any::<u8>(), 65),
    ) {
        let bytes = encode_vote_payload(proposal, vote, txid, vout, &signature);
        let decoded = Vote::decode(&bytes, OutPoint::NULL, 0, 0).unwrap();
        prop_assert_eq!(decoded.encode(), bytes);
    }

    /// Signature lengths other than 65 invalidate the payload.
    #[test]
    fn vote_rejects_other_signature_lengths(
        proposal in prop::array::uniform32(0u8..),
        vote in 0u8..3,
        siglen in prop::sample::select(vec![0usize, 1, 64, 66, 80]),
    ) {
        let bytes = encode_vote_payload(proposal, vote, [0u8; 32], 0, &vec![7u8; siglen]);
        prop_assert!(Vote::decode(&bytes, OutPoint::NULL, 0, 0).is_err());
    }

    /// The identifying hash ignores the vote selector; the signature hash
    /// does not.
    #[test]
    fn vote_hash_stability(
        proposal in prop::array::uniform32(0u8..),
        txid in prop::array::uniform32(0u8..),
        vout in any::<u32>(),
        a in 0u8..3,
        b in 0u8..3,
    ) {
        let utxo = OutPoint::new(Hash256::new(txid), vout);
        let va = Vote::new(Hash256::new(proposal), VoteType::from_u8(a).unwrap(), utxo);
        let vb = Vote::new(Hash256::new(proposal), VoteType::from_u8(b).unwrap(), utxo);
        prop_assert_eq!(va.hash(), vb.hash());
        prop_assert_eq!(va.sig_hash() == vb.sig_hash(), a == b);
    }

    /// Cutoff acceptance is monotone: accepted at height h means accepted
    /// at every earlier height.
    #[test]
    fn proposal_cutoff_monotone(
        multiple in 1i32..1000,
        h in 0i32..200_000,
        earlier in 0i32..200_000,
    ) {
        let params = ConsensusParams::regtest();
        let proposal = Proposal::new(
            "prop",
            multiple * params.superblock,
            Amount::new(100),
            "addr",
            "",
            "",
        );
        prop_assume!(earlier < h);
        if proposal.meets_cutoff(h, &params) {
            prop_assert!(proposal.meets_cutoff(earlier, &params));
        }
    }
}
