//! Transaction scripts.
//!
//! Only the small surface the governance core needs: OP_RETURN data
//! carriers, the pay-to-pubkey-hash template, and push extraction from
//! unlocking scripts.

use crate::keys::{KeyId, PublicKey};

/// Script opcodes used by this crate.
pub mod opcodes {
    pub const OP_PUSHDATA1: u8 = 0x4c;
    pub const OP_PUSHDATA2: u8 = 0x4d;
    pub const OP_PUSHDATA4: u8 = 0x4e;
    pub const OP_RETURN: u8 = 0x6a;
    pub const OP_DUP: u8 = 0x76;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_CHECKSIG: u8 = 0xac;
}

use opcodes::*;

/// An owned byte script.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends a minimally-encoded data push.
    pub fn push_slice(&mut self, data: &[u8]) {
        match data.len() {
            0..=0x4b => self.0.push(data.len() as u8),
            0x4c..=0xff => {
                self.0.push(OP_PUSHDATA1);
                self.0.push(data.len() as u8);
            }
            0x100..=0xffff => {
                self.0.push(OP_PUSHDATA2);
                self.0.extend_from_slice(&(data.len() as u16).to_le_bytes());
            }
            _ => {
                self.0.push(OP_PUSHDATA4);
                self.0.extend_from_slice(&(data.len() as u32).to_le_bytes());
            }
        }
        self.0.extend_from_slice(data);
    }

    /// A data-only output script: `OP_RETURN <payload>`.
    pub fn op_return(payload: &[u8]) -> Self {
        let mut s = Self(vec![OP_RETURN]);
        s.push_slice(payload);
        s
    }

    /// The standard pay-to-pubkey-hash locking script.
    pub fn p2pkh(key_id: &KeyId) -> Self {
        let mut s = Self(vec![OP_DUP, OP_HASH160]);
        s.push_slice(key_id.as_bytes());
        s.0.push(OP_EQUALVERIFY);
        s.0.push(OP_CHECKSIG);
        s
    }

    pub fn is_op_return(&self) -> bool {
        self.0.first() == Some(&OP_RETURN)
    }

    /// Extracts a candidate governance payload: if the script starts with
    /// OP_RETURN, returns the first non-empty data push. Malformed scripts
    /// yield `None`.
    pub fn op_return_payload(&self) -> Option<Vec<u8>> {
        if !self.is_op_return() {
            return None;
        }
        self.ops().find(|(_, data)| !data.is_empty()).map(|(_, data)| data.to_vec())
    }

    /// The key id locked by this script, if it is the standard
    /// pay-to-pubkey-hash template.
    pub fn p2pkh_key_id(&self) -> Option<KeyId> {
        let b = &self.0;
        if b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == 20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
        {
            Some(KeyId::new(b[3..23].try_into().unwrap()))
        } else {
            None
        }
    }

    /// Scans the script for the first push of public-key length (compressed
    /// or uncompressed) and returns its bytes. Used to bind an OP_RETURN
    /// vote to a signer of the carrying transaction.
    pub fn pushed_pubkey(&self) -> Option<&[u8]> {
        self.ops().map(|(_, data)| data).find(|data| {
            data.len() == PublicKey::SIZE || data.len() == PublicKey::UNCOMPRESSED_SIZE
        })
    }

    /// Iterates `(opcode, push-data)` pairs. Stops at the first malformed
    /// opcode, mirroring the standard script parser.
    pub fn ops(&self) -> ScriptOps<'_> {
        ScriptOps {
            bytes: &self.0,
            pos: 0,
        }
    }
}

/// Iterator over script operations.
pub struct ScriptOps<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for ScriptOps<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let opcode = *self.bytes.get(self.pos)?;
        self.pos += 1;
        let len = match opcode {
            1..=0x4b => opcode as usize,
            OP_PUSHDATA1 => {
                let n = *self.bytes.get(self.pos)? as usize;
                self.pos += 1;
                n
            }
            OP_PUSHDATA2 => {
                let b = self.bytes.get(self.pos..self.pos + 2)?;
                self.pos += 2;
                u16::from_le_bytes(b.try_into().unwrap()) as usize
            }
            OP_PUSHDATA4 => {
                let b = self.bytes.get(self.pos..self.pos + 4)?;
                self.pos += 4;
                u32::from_le_bytes(b.try_into().unwrap()) as usize
            }
            _ => 0,
        };
        let data = self.bytes.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some((opcode, data))
    }
}
