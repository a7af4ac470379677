//! Base58check pay-to-pubkey-hash addresses.

use obol_types::KeyId;

/// Version byte for pay-to-pubkey-hash addresses.
pub const P2PKH_VERSION: u8 = 26;

/// Encodes a key id as a base58check address.
pub fn encode_address(key_id: &KeyId) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(P2PKH_VERSION);
    payload.extend_from_slice(key_id.as_bytes());
    bs58::encode(payload).with_check().into_string()
}

/// Decodes a base58check address into the key id it pays.
///
/// Returns `None` on bad checksum, wrong version byte, or wrong length.
pub fn decode_address(address: &str) -> Option<KeyId> {
    let data = bs58::decode(address)
        .with_check(Some(P2PKH_VERSION))
        .into_vec()
        .ok()?;
    if data.len() != 21 {
        return None;
    }
    Some(KeyId::new(data[1..].try_into().ok()?))
}
