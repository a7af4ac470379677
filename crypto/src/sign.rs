//! Compact recoverable ECDSA over secp256k1.
//!
//! Signatures are 65 bytes: a header byte encoding the recovery id and the
//! compressed-key flag, followed by the 64-byte signature. The signer's
//! public key is recovered from the signature and the message digest, so
//! votes never carry an explicit key.

use obol_types::{Hash256, PrivateKey, PublicKey, Signature};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{All, Message, Secp256k1, SecretKey};
use std::sync::OnceLock;

/// Header base for recoverable signatures; +4 marks a compressed key.
const HEADER_BASE: u8 = 27;
const HEADER_COMPRESSED: u8 = 4;

fn secp() -> &'static Secp256k1<All> {
    static SECP: OnceLock<Secp256k1<All>> = OnceLock::new();
    SECP.get_or_init(Secp256k1::new)
}

/// Signs a 32-byte digest, producing a compact recoverable signature.
///
/// Returns `None` if the private key is out of range.
pub fn sign_compact(digest: &Hash256, key: &PrivateKey) -> Option<Signature> {
    let secret = SecretKey::from_slice(&key.0).ok()?;
    let msg = Message::from_digest(*digest.as_bytes());
    let (recid, sig64) = secp()
        .sign_ecdsa_recoverable(&msg, &secret)
        .serialize_compact();
    let mut out = [0u8; 65];
    out[0] = HEADER_BASE + recid.to_i32() as u8 + HEADER_COMPRESSED;
    out[1..].copy_from_slice(&sig64);
    Some(Signature::new(out))
}

/// Recovers the compressed public key that produced `sig` over `digest`.
pub fn recover_compact(digest: &Hash256, sig: &Signature) -> Option<PublicKey> {
    let bytes = sig.as_bytes();
    let header = bytes[0];
    if !(HEADER_BASE..HEADER_BASE + 8).contains(&header) {
        return None;
    }
    let recid = RecoveryId::from_i32(((header - HEADER_BASE) & 3) as i32).ok()?;
    let rsig = RecoverableSignature::from_compact(&bytes[1..], recid).ok()?;
    let msg = Message::from_digest(*digest.as_bytes());
    let pubkey = secp().recover_ecdsa(&msg, &rsig).ok()?;
    Some(PublicKey::new(pubkey.serialize()))
}

/// Derives the compressed public key for a private key.
pub fn public_from_private(key: &PrivateKey) -> Option<PublicKey> {
    let secret = SecretKey::from_slice(&key.0).ok()?;
    let pubkey = secp256k1::PublicKey::from_secret_key(secp(), &secret);
    Some(PublicKey::new(pubkey.serialize()))
}

/// Parses a public key from script bytes (compressed or uncompressed),
/// normalizing to the compressed form.
pub fn pubkey_from_slice(bytes: &[u8]) -> Option<PublicKey> {
    let pubkey = secp256k1::PublicKey::from_slice(bytes).ok()?;
    Some(PublicKey::new(pubkey.serialize()))
}
