//! Transactions, inputs, outputs, and outpoints.

use crate::amount::Amount;
use crate::encoding::{DecodeError, Decoder, Encoder};
use crate::hash::Hash256;
use crate::script::Script;
use serde::{Deserialize, Serialize};

/// A reference to a transaction output.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct OutPoint {
    pub txid: Hash256,
    pub vout: u32,
}

impl OutPoint {
    /// The null outpoint used by coinbase inputs.
    pub const NULL: Self = Self {
        txid: Hash256::ZERO,
        vout: u32::MAX,
    };

    pub fn new(txid: Hash256, vout: u32) -> Self {
        Self { txid, vout }
    }

    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.vout == u32::MAX
    }

    pub fn encode_into(&self, enc: &mut Encoder) {
        enc.write_hash(&self.txid);
        enc.write_u32_le(self.vout);
    }

    pub fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            txid: dec.read_hash()?,
            vout: dec.read_u32_le()?,
        })
    }
}

/// A transaction input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
}

impl TxIn {
    pub fn new(prevout: OutPoint, script_sig: Script) -> Self {
        Self {
            prevout,
            script_sig,
            sequence: u32::MAX,
        }
    }

    fn encode_into(&self, enc: &mut Encoder) {
        self.prevout.encode_into(enc);
        enc.write_var_bytes(self.script_sig.as_bytes());
        enc.write_u32_le(self.sequence);
    }

    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            prevout: OutPoint::decode_from(dec)?,
            script_sig: Script::new(dec.read_var_bytes()?),
            sequence: dec.read_u32_le()?,
        })
    }
}

/// A transaction output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOut {
    pub value: Amount,
    pub script_pubkey: Script,
}

impl TxOut {
    pub fn new(value: Amount, script_pubkey: Script) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }

    fn encode_into(&self, enc: &mut Encoder) {
        enc.write_i64_le(self.value.raw());
        enc.write_var_bytes(self.script_pubkey.as_bytes());
    }

    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            value: Amount::new(dec.read_i64_le()?),
            script_pubkey: Script::new(dec.read_var_bytes()?),
        })
    }
}

/// A transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn new(inputs: Vec<TxIn>, outputs: Vec<TxOut>) -> Self {
        Self {
            version: 1,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        self.encode_into(&mut enc);
        enc.into_bytes()
    }

    pub fn encode_into(&self, enc: &mut Encoder) {
        enc.write_i32_le(self.version);
        enc.write_compact_size(self.inputs.len() as u64);
        for input in &self.inputs {
            input.encode_into(enc);
        }
        enc.write_compact_size(self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode_into(enc);
        }
        enc.write_u32_le(self.lock_time);
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut dec = Decoder::new(bytes);
        let tx = Self::decode_from(&mut dec)?;
        dec.finish()?;
        Ok(tx)
    }

    pub fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let version = dec.read_i32_le()?;
        let n_in = dec.read_compact_size()?;
        let mut inputs = Vec::with_capacity(n_in.min(1024) as usize);
        for _ in 0..n_in {
            inputs.push(TxIn::decode_from(dec)?);
        }
        let n_out = dec.read_compact_size()?;
        let mut outputs = Vec::with_capacity(n_out.min(1024) as usize);
        for _ in 0..n_out {
            outputs.push(TxOut::decode_from(dec)?);
        }
        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time: dec.read_u32_le()?,
        })
    }
}
