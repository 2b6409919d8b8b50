//! Cursor over ROOT's big-endian serialization format.
//!
//! The decoder tree ([`crate::reader`]) consumes raw branch bytes through
//! this cursor. Only the conventions the JUNO readers need are covered:
//! big-endian primitives, ROOT strings, versioned-record headers and the
//! `TObject` preamble.

use crate::error::{EdmError, Result};

/// ROOT marks a versioned record with a byte count by setting this bit on
/// the leading u32.
const K_BYTE_COUNT_MASK: u32 = 0x4000_0000;

/// `TObject::fBits` flag: the object carries a 2-byte process id after
/// its header.
const K_IS_REFERENCED: u32 = 0x0800_0000;

macro_rules! read_be {
    ($fn_name:ident, $ty:ty) => {
        /// Read one big-endian value, advancing the cursor.
        pub fn $fn_name(&mut self) -> Result<$ty> {
            const N: usize = std::mem::size_of::<$ty>();
            let bytes = self.take(N)?;
            let mut buf = [0u8; N];
            buf.copy_from_slice(bytes);
            Ok(<$ty>::from_be_bytes(buf))
        }
    };
}

/// Bounds-checked read cursor over a byte slice.
pub struct WireCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireCursor<'a> {
    /// Create a cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current absolute position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes remaining from the current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Move to an absolute position. Positions past the end are rejected.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(EdmError::BufferUnderflow {
                offset: self.pos,
                need: pos.saturating_sub(self.pos),
                have: self.remaining(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Skip `n` bytes forward.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        let _ = self.take(n)?;
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(EdmError::BufferUnderflow {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    read_be!(read_u8, u8);
    read_be!(read_i8, i8);
    read_be!(read_u16, u16);
    read_be!(read_i16, i16);
    read_be!(read_u32, u32);
    read_be!(read_i32, i32);
    read_be!(read_u64, u64);
    read_be!(read_i64, i64);
    read_be!(read_f32, f32);
    read_be!(read_f64, f64);

    /// Read a boolean stored as one byte.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a ROOT-encoded string: length byte, with `255` escaping to a
    /// u32 length, then the raw bytes.
    pub fn read_string(&mut self) -> Result<String> {
        let first = self.read_u8()?;
        let len = if first == 255 { self.read_u32()? as usize } else { first as usize };
        if len == 0 {
            return Ok(String::new());
        }
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a versioned-record header.
    ///
    /// Returns `(version, end_pos)`; `end_pos` is the absolute position
    /// where the record ends, or `None` when the stream carries no byte
    /// count (old-style two-byte version only).
    pub fn read_record_header(&mut self) -> Result<(u16, Option<usize>)> {
        let start = self.pos;
        let raw = self.read_u32()?;
        if raw & K_BYTE_COUNT_MASK != 0 {
            let byte_count = (raw & !K_BYTE_COUNT_MASK) as usize;
            let version = self.read_u16()?;
            // byte_count spans from right after the leading u32
            Ok((version, Some(start + 4 + byte_count)))
        } else {
            let version = (raw >> 16) as u16;
            self.pos = start + 2;
            Ok((version, None))
        }
    }

    /// Skip a `TObject` preamble: version, fUniqueID, fBits, and the
    /// optional 2-byte process id when `kIsReferenced` is set.
    pub fn skip_tobject(&mut self) -> Result<()> {
        let _ver = self.read_u16()?;
        let _unique_id = self.read_u32()?;
        let bits = self.read_u32()?;
        if bits & K_IS_REFERENCED != 0 {
            self.skip(2)?;
        }
        Ok(())
    }
}
