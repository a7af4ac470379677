//! Canonical wire codec.
//!
//! The consensus serialization format: little-endian integers,
//! compact-size-prefixed byte strings, no padding or alignment. Decoding is
//! strict: compact sizes must be minimally encoded, and object decoders
//! call [`Decoder::finish`] so that trailing bytes invalidate the object.

use crate::hash::Hash256;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("non-canonical compact size")]
    NonCanonicalCompactSize,

    #[error("invalid utf-8 in string")]
    InvalidUtf8,

    #[error("trailing bytes after object")]
    TrailingBytes,

    #[error("invalid value for {0}")]
    InvalidValue(&'static str),
}

/// Serializer for the canonical wire format.
#[derive(Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32_le(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64_le(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_hash(&mut self, hash: &Hash256) {
        self.buf.extend_from_slice(hash.as_bytes());
    }

    /// Bitcoin-style compact size: 1, 3, 5, or 9 bytes depending on magnitude.
    pub fn write_compact_size(&mut self, v: u64) {
        match v {
            0..=0xfc => self.buf.push(v as u8),
            0xfd..=0xffff => {
                self.buf.push(0xfd);
                self.buf.extend_from_slice(&(v as u16).to_le_bytes());
            }
            0x1_0000..=0xffff_ffff => {
                self.buf.push(0xfe);
                self.buf.extend_from_slice(&(v as u32).to_le_bytes());
            }
            _ => {
                self.buf.push(0xff);
                self.buf.extend_from_slice(&v.to_le_bytes());
            }
        }
    }

    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_compact_size(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_var_str(&mut self, s: &str) {
        self.write_var_bytes(s.as_bytes());
    }
}

/// Strict deserializer for the canonical wire format.
pub struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fails unless every input byte has been consumed.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::TrailingBytes)
        }
    }

    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEnd);
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_slice(1)?[0])
    }

    pub fn read_u32_le(&mut self) -> Result<u32, DecodeError> {
        let b = self.read_slice(4)?;
        Ok(u32::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_i32_le(&mut self) -> Result<i32, DecodeError> {
        let b = self.read_slice(4)?;
        Ok(i32::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_i64_le(&mut self) -> Result<i64, DecodeError> {
        let b = self.read_slice(8)?;
        Ok(i64::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_hash(&mut self) -> Result<Hash256, DecodeError> {
        let b = self.read_slice(32)?;
        Ok(Hash256::new(b.try_into().unwrap()))
    }

    /// Reads a compact size, rejecting non-minimal encodings.
    pub fn read_compact_size(&mut self) -> Result<u64, DecodeError> {
        let tag = self.read_u8()?;
        let v = match tag {
            0xfd => {
                let b = self.read_slice(2)?;
                let v = u16::from_le_bytes(b.try_into().unwrap()) as u64;
                if v < 0xfd {
                    return Err(DecodeError::NonCanonicalCompactSize);
                }
                v
            }
            0xfe => {
                let v = self.read_u32_le()? as u64;
                if v <= 0xffff {
                    return Err(DecodeError::NonCanonicalCompactSize);
                }
                v
            }
            0xff => {
                let b = self.read_slice(8)?;
                let v = u64::from_le_bytes(b.try_into().unwrap());
                if v <= 0xffff_ffff {
                    return Err(DecodeError::NonCanonicalCompactSize);
                }
                v
            }
            _ => tag as u64,
        };
        Ok(v)
    }

    pub fn read_var_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_compact_size()?;
        if len > self.remaining() as u64 {
            return Err(DecodeError::UnexpectedEnd);
        }
        Ok(self.read_slice(len as usize)?.to_vec())
    }

    pub fn read_var_str(&mut self) -> Result<String, DecodeError> {
        let bytes = self.read_var_bytes()?;
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_size_boundaries() {
        for v in [0u64, 0xfc, 0xfd, 0xffff, 0x1_0000, 0xffff_ffff, 0x1_0000_0000] {
            let mut enc = Encoder::new();
            enc.write_compact_size(v);
            let bytes = enc.into_bytes();
            let mut dec = Decoder::new(&bytes);
            assert_eq!(dec.read_compact_size().unwrap(), v);
            assert!(dec.is_empty());
        }
    }

    #[test]
    fn compact_size_rejects_non_minimal() {
        // 0xfc encoded with the 3-byte form.
        let bytes = [0xfd, 0xfc, 0x00];
        let mut dec = Decoder::new(&bytes);
        assert_eq!(
            dec.read_compact_size(),
            Err(DecodeError::NonCanonicalCompactSize)
        );
    }

    #[test]
    fn var_bytes_length_capped_by_input() {
        // Claims 100 bytes but provides 2.
        let bytes = [100u8, 0xaa, 0xbb];
        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.read_var_bytes(), Err(DecodeError::UnexpectedEnd));
    }

    #[test]
    fn var_str_roundtrip() {
        let mut enc = Encoder::new();
        enc.write_var_str("open source governance");
        let bytes = enc.into_bytes();
        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.read_var_str().unwrap(), "open source governance");
        assert!(dec.finish().is_ok());
    }

    #[test]
    fn finish_rejects_trailing() {
        let mut enc = Encoder::new();
        enc.write_u8(1);
        enc.write_u8(2);
        let bytes = enc.into_bytes();
        let mut dec = Decoder::new(&bytes);
        dec.read_u8().unwrap();
        assert_eq!(dec.finish(), Err(DecodeError::TrailingBytes));
    }

    #[test]
    fn integers_are_little_endian() {
        let mut enc = Encoder::new();
        enc.write_u32_le(0x0102_0304);
        assert_eq!(enc.as_bytes(), &[0x04, 0x03, 0x02, 0x01]);
    }
}
