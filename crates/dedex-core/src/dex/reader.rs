//! Low-level reading of dex primitives.
//!
//! All multi-byte integers in a dex file are little-endian. Variable-length
//! values use LEB128 (at most five bytes for a 32-bit value). Strings are
//! stored as modified UTF-8: like UTF-8, except that NUL is encoded as the
//! two-byte sequence `C0 80` and supplementary characters are written as
//! surrogate pairs of three bytes each.

use crate::error::{Error, Result};

/// Cursor over a dex image
#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at `offset`
    pub(crate) fn at(data: &'a [u8], offset: usize) -> Result<Self> {
        if offset > data.len() {
            return Err(Error::invalid_container(
                offset,
                format!("offset past end of data ({} bytes)", data.len()),
            ));
        }
        Ok(Self {
            data,
            position: offset,
        })
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                Error::invalid_container(
                    self.position,
                    format!("not enough bytes (need {})", len),
                )
            })?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len)
    }

    /// Reads an unsigned LEB128 value
    pub(crate) fn uleb128(&mut self) -> Result<u32> {
        let (value, len) = decode_uleb128(&self.data[self.position..])
            .map_err(|_| Error::invalid_container(self.position, "bad uleb128 value"))?;
        self.position += len;
        Ok(value)
    }

    /// Reads a NUL-terminated modified UTF-8 string
    pub(crate) fn mutf8(&mut self) -> Result<String> {
        let start = self.position;
        let rest = &self.data[start..];
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::invalid_container(start, "unterminated string"))?;
        self.position += end + 1;
        Ok(decode_mutf8(&rest[..end]))
    }
}

/// Decode an unsigned LEB128 value.
///
/// Returns the decoded value and the number of bytes consumed.
pub(crate) fn decode_uleb128(data: &[u8]) -> Result<(u32, usize)> {
    let mut result: u32 = 0;

    for (i, &byte) in data.iter().enumerate() {
        if i >= 5 {
            return Err(Error::invalid_container(i, "uleb128 longer than 5 bytes"));
        }

        result |= ((byte & 0x7F) as u32) << (7 * i);

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(Error::invalid_container(data.len(), "truncated uleb128"))
}

/// Decode modified UTF-8 bytes (without the terminator)
pub(crate) fn decode_mutf8(bytes: &[u8]) -> String {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let (unit, len) = if b & 0x80 == 0 {
            (b as u16, 1)
        } else if b & 0xE0 == 0xC0 && i + 1 < bytes.len() {
            ((((b & 0x1F) as u16) << 6) | (bytes[i + 1] & 0x3F) as u16, 2)
        } else if b & 0xF0 == 0xE0 && i + 2 < bytes.len() {
            (
                (((b & 0x0F) as u16) << 12)
                    | (((bytes[i + 1] & 0x3F) as u16) << 6)
                    | (bytes[i + 2] & 0x3F) as u16,
                3,
            )
        } else {
            (char::REPLACEMENT_CHARACTER as u16, 1)
        };
        units.push(unit);
        i += len;
    }

    String::from_utf16_lossy(&units)
}
