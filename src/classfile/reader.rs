//! Low-level big-endian reading utilities for class file parsing.

use crate::{Error, Result};

/// A bounds-checked cursor over a byte slice.
///
/// Every multi-byte value in the class file format is big-endian. Read
/// failures carry the current offset so corruption reports point at the
/// exact byte.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current offset from the start of the slice.
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        let bytes = self.take(1)?;
        Ok(bytes[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn i32(&mut self) -> Result<i32> {
        self.u32().map(|value| value as i32)
    }

    /// Reads `count` bytes, advancing the cursor.
    pub(crate) fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(Error::corrupt_class(
                self.pos as u64,
                format!("needed {count} more bytes, {} available", self.remaining()),
            ));
        }
        let slice = &self.bytes[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// Builds a corruption error anchored at the current offset.
    pub(crate) fn corrupt(&self, reason: impl Into<String>) -> Error {
        Error::corrupt_class(self.pos as u64, reason)
    }
}
