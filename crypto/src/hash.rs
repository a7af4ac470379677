//! Consensus hashing: double SHA-256 and HASH160.

use obol_types::{Hash256, KeyId, PublicKey, Transaction};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Double SHA-256 of arbitrary data.
pub fn sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    Hash256::new(second.into())
}

/// RIPEMD-160 of SHA-256, the 160-bit key-id digest.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}

/// The key id controlling pay-to-pubkey-hash outputs locked to `pubkey`.
pub fn key_id(pubkey: &PublicKey) -> KeyId {
    KeyId::new(hash160(pubkey.as_bytes()))
}

/// Transaction id: double SHA-256 of the canonical encoding.
pub fn txid(tx: &Transaction) -> Hash256 {
    sha256d(&tx.encode())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn sha256d_empty_matches_known_vector() {
        assert_eq!(
            sha256d(b"").to_string(),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn hash160_empty_matches_known_vector() {
        assert_eq!(
            hex(&hash160(b"")),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }

    #[test]
    fn sha256d_deterministic() {
        assert_eq!(sha256d(b"obol"), sha256d(b"obol"));
        assert_ne!(sha256d(b"obol"), sha256d(b"obo1"));
    }

    #[test]
    fn txid_changes_with_content() {
        use obol_types::{Amount, OutPoint, Script, TxIn, TxOut};
        let base = Transaction::new(
            vec![TxIn::new(OutPoint::NULL, Script::default())],
            vec![TxOut::new(Amount::new(1), Script::default())],
        );
        let mut other = base.clone();
        other.outputs[0].value = Amount::new(2);
        assert_ne!(txid(&base), txid(&other));
    }
}
