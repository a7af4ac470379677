use proptest::prelude::*;

use obol_types::{
    Amount, Decoder, Encoder, Hash256, KeyId, OutPoint, Script, Transaction, TxIn, TxOut,
};

proptest! {
    /// Compact sizes round-trip and decode to the same value.
    #[test]
    fn compact_size_roundtrip(v in 0u64..u64::MAX) {
        let mut enc = Encoder::new();
        enc.write_compact_size(v);
        let bytes = enc.into_bytes();
        let mut dec = Decoder::new(&bytes);
        prop_assert_eq!(dec.read_compact_size().unwrap(), v);
        prop_assert!(dec.finish().is_ok());
    }

    /// Variable-length byte strings round-trip exactly.
    #[test]
    fn var_bytes_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut enc = Encoder::new();
        enc.write_var_bytes(&data);
        let bytes = enc.into_bytes();
        let mut dec = Decoder::new(&bytes);
        prop_assert_eq!(dec.read_var_bytes().unwrap(), data);
        prop_assert!(dec.finish().is_ok());
    }

    /// Strings round-trip through the codec.
    #[test]
    fn var_str_roundtrip(s in "\\PC{0,128}") {
        let mut enc = Encoder::new();
        enc.write_var_str(&s);
        let bytes = enc.into_bytes();
        let mut dec = Decoder::new(&bytes);
        prop_assert_eq!(dec.read_var_str().unwrap(), s);
    }

    /// Mixed integer fields decode in order.
    #[test]
    fn integer_fields_roundtrip(a in any::<u8>(), b in any::<i32>(), c in any::<i64>(), d in any::<u32>()) {
        let mut enc = Encoder::new();
        enc.write_u8(a);
        enc.write_i32_le(b);
        enc.write_i64_le(c);
        enc.write_u32_le(d);
        let bytes = enc.into_bytes();
        let mut dec = Decoder::new(&bytes);
        prop_assert_eq!(dec.read_u8().unwrap(), a);
        prop_assert_eq!(dec.read_i32_le().unwrap(), b);
        prop_assert_eq!(dec.read_i64_le().unwrap(), c);
        prop_assert_eq!(dec.read_u32_le().unwrap(), d);
        prop_assert!(dec.finish().is_ok());
    }

    /// Outpoints round-trip through the codec.
    #[test]
    fn outpoint_roundtrip(txid in prop::array::uniform32(0u8..), vout in any::<u32>()) {
        let outpoint = OutPoint::new(Hash256::new(txid), vout);
        let mut enc = Encoder::new();
        outpoint.encode_into(&mut enc);
        let bytes = enc.into_bytes();
        let mut dec = Decoder::new(&bytes);
        prop_assert_eq!(OutPoint::decode_from(&mut dec).unwrap(), outpoint);
    }

    /// Transactions round-trip through the codec.
    #[test]
    fn transaction_roundtrip(
        txid in prop::array::uniform32(0u8..),
        vout in any::<u32>(),
        value in 0i64..21_000_000_0000_0000,
        keyid in prop::array::uniform20(0u8..),
        payload in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let tx = Transaction::new(
            vec![TxIn::new(OutPoint::new(Hash256::new(txid), vout), Script::default())],
            vec![
                TxOut::new(Amount::new(value), Script::p2pkh(&KeyId::new(keyid))),
                TxOut::new(Amount::ZERO, Script::op_return(&payload)),
            ],
        );
        let decoded = Transaction::decode(&tx.encode()).unwrap();
        prop_assert_eq!(decoded, tx);
    }

    /// Hash ordering agrees with 256-bit little-endian integer ordering
    /// on single-byte values.
    #[test]
    fn hash_ordering_single_byte(a in any::<u8>(), b in any::<u8>()) {
        let mut ba = [0u8; 32];
        ba[0] = a;
        let mut bb = [0u8; 32];
        bb[0] = b;
        prop_assert_eq!(Hash256::new(ba) < Hash256::new(bb), a < b);
    }

    /// Script data pushes survive the op iterator regardless of size class.
    #[test]
    fn script_push_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..600)) {
        let mut script = Script::default();
        script.push_slice(&data);
        let ops: Vec<_> = script.ops().collect();
        prop_assert_eq!(ops.len(), 1);
        prop_assert_eq!(ops[0].1, &data[..]);
    }
}
