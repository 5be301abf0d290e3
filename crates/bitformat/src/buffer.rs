//! Growable byte storage with independent read and write offsets.

use bytes::{Buf, Bytes, BytesMut};

use crate::{endian::Endian, errors::CodecError};

/// Byte storage read from one offset and written at another.
///
/// Reads never move the write offset and writes never move the read offset.
/// Writing past the end grows the storage; nothing shrinks it.
#[derive(Debug, Clone, Default)]
pub struct CursorBuffer {
    data: BytesMut,
    read_offset: usize,
    write_offset: usize,
}

macro_rules! endian_access {
    ($($read:ident, $write:ident, $ty:ty, $get_be:ident, $get_le:ident;)*) => {
        $(
            pub fn $read(&mut self, endian: Endian) -> Result<$ty, CodecError> {
                let mut src = self.take(size_of::<$ty>())?;
                Ok(match endian {
                    Endian::Big => src.$get_be(),
                    Endian::Little => src.$get_le(),
                })
            }

            pub fn $write(&mut self, value: $ty, endian: Endian) {
                match endian {
                    Endian::Big => self.write_bytes(&value.to_be_bytes()),
                    Endian::Little => self.write_bytes(&value.to_le_bytes()),
                }
            }
        )*
    };
}

impl CursorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            ..Default::default()
        }
    }

    /// A buffer holding a copy of `bytes`, read offset at 0 and write offset at the end.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: BytesMut::from(bytes),
            read_offset: 0,
            write_offset: bytes.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read_offset(&self) -> usize {
        self.read_offset
    }

    pub fn write_offset(&self) -> usize {
        self.write_offset
    }

    /// Bytes between the read offset and the end of the storage.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.read_offset)
    }

    /// Moves the read offset. Fails if `offset` is past the end.
    pub fn set_read_offset(&mut self, offset: usize) -> Result<(), CodecError> {
        if offset > self.data.len() {
            return Err(CodecError::UnexpectedEof {
                offset,
                needed: 0,
                available: 0,
            });
        }

        self.read_offset = offset;
        Ok(())
    }

    /// Moves the write offset. Writing past the end fills the gap with zeros.
    pub fn set_write_offset(&mut self, offset: usize) {
        self.write_offset = offset;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data.freeze()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Consumes `n` bytes at the read offset.
    fn take(&mut self, n: usize) -> Result<&[u8], CodecError> {
        let available = self.remaining();
        if n > available {
            return Err(CodecError::UnexpectedEof {
                offset: self.read_offset,
                needed: n,
                available,
            });
        }

        let start = self.read_offset;
        self.read_offset += n;
        Ok(&self.data[start..start + n])
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?.get_u8())
    }

    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.take(1)?.get_i8())
    }

    endian_access! {
        read_u16, write_u16, u16, get_u16, get_u16_le;
        read_i16, write_i16, i16, get_i16, get_i16_le;
        read_u32, write_u32, u32, get_u32, get_u32_le;
        read_i32, write_i32, i32, get_i32, get_i32_le;
        read_u64, write_u64, u64, get_u64, get_u64_le;
        read_i64, write_i64, i64, get_i64, get_i64_le;
        read_f32, write_f32, f32, get_f32, get_f32_le;
        read_f64, write_f64, f64, get_f64, get_f64_le;
    }

    /// Reads exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8], CodecError> {
        self.take(n)
    }

    /// Reads everything from the read offset to the end.
    pub fn read_to_end(&mut self) -> &[u8] {
        let start = self.read_offset.min(self.data.len());
        self.read_offset = self.data.len();
        &self.data[start..]
    }

    /// Reads up to the next zero byte, consuming the zero but not returning it.
    pub fn read_until_zero(&mut self) -> Result<&[u8], CodecError> {
        self.read_until_zero_unit(1)
    }

    /// Like [CursorBuffer::read_until_zero], but the terminator is a run of
    /// `width` zero bytes starting on a multiple of `width` from the read offset.
    pub fn read_until_zero_unit(&mut self, width: usize) -> Result<&[u8], CodecError> {
        let width = width.max(1);
        let start = self.read_offset.min(self.data.len());
        let units = self.data[start..]
            .chunks_exact(width)
            .position(|unit| unit.iter().all(|b| *b == 0))
            .ok_or(CodecError::MissingTerminator { offset: start })?;

        let len = units * width;
        self.read_offset = start + len + width;
        Ok(&self.data[start..start + len])
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// Writes `bytes` at the write offset, growing the storage as needed.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let end = self.write_offset + bytes.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }

        self.data[self.write_offset..end].copy_from_slice(bytes);
        self.write_offset = end;
    }

    /// Writes `n` zero bytes.
    pub fn write_zeros(&mut self, n: usize) {
        let end = self.write_offset + n;
        if end > self.data.len() {
            self.data.resize(end, 0);
        }

        self.data[self.write_offset..end].fill(0);
        self.write_offset = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_reads() {
        let mut buffer = CursorBuffer::from_bytes(&[0x01, 0x02, 0x01, 0x02, 0xFF]);
        assert_eq!(buffer.read_u16(Endian::Big).unwrap(), 0x0102);
        assert_eq!(buffer.read_u16(Endian::Little).unwrap(), 0x0201);
        assert_eq!(buffer.read_i8().unwrap(), -1);
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let mut buffer = CursorBuffer::from_bytes(&[0x01, 0x02, 0x03]);
        buffer.read_u8().unwrap();
        assert_eq!(
            buffer.read_u32(Endian::Big).unwrap_err(),
            CodecError::UnexpectedEof {
                offset: 1,
                needed: 4,
                available: 2
            }
        );
        // A failed read leaves the offset untouched.
        assert_eq!(buffer.read_offset(), 1);
    }

    #[test]
    fn test_writes_grow_storage() {
        let mut buffer = CursorBuffer::new();
        buffer.write_u16(0x0102, Endian::Little);
        buffer.write_u32(0x0A0B0C0D, Endian::Big);
        buffer.write_f32(1.0, Endian::Big);
        assert_eq!(buffer.write_offset(), 10);
        assert_eq!(
            buffer.as_slice(),
            &[0x02, 0x01, 0x0A, 0x0B, 0x0C, 0x0D, 0x3F, 0x80, 0x00, 0x00]
        );
    }

    #[test]
    fn test_offsets_are_independent() {
        let mut buffer = CursorBuffer::new();
        buffer.write_bytes(b"abc");
        assert_eq!(buffer.read_offset(), 0);
        assert_eq!(buffer.read_bytes(2).unwrap(), b"ab");
        buffer.write_u8(b'd');
        assert_eq!(buffer.write_offset(), 4);
        assert_eq!(buffer.read_to_end(), b"cd");
    }

    #[test]
    fn test_overwrite_in_place() {
        let mut buffer = CursorBuffer::from_bytes(&[1, 2, 3, 4]);
        buffer.set_write_offset(1);
        buffer.write_bytes(&[9, 9]);
        assert_eq!(buffer.as_slice(), &[1, 9, 9, 4]);

        buffer.set_write_offset(6);
        buffer.write_u8(7);
        assert_eq!(buffer.as_slice(), &[1, 9, 9, 4, 0, 0, 7]);
    }

    #[test]
    fn test_read_until_zero() {
        let mut buffer = CursorBuffer::from_bytes(b"hi\0there");
        assert_eq!(buffer.read_until_zero().unwrap(), b"hi");
        assert_eq!(buffer.read_offset(), 3);
        assert_eq!(
            buffer.read_until_zero().unwrap_err(),
            CodecError::MissingTerminator { offset: 3 }
        );
    }

    #[test]
    fn test_read_until_zero_unit() {
        let mut buffer = CursorBuffer::from_bytes(&[b'h', 0, b'i', 0, 0, 0, 7]);
        assert_eq!(buffer.read_until_zero_unit(2).unwrap(), &[b'h', 0, b'i', 0]);
        assert_eq!(buffer.read_offset(), 6);

        // A zero pair straddling two units is not a terminator.
        let mut buffer = CursorBuffer::from_bytes(&[b'a', 0, 0, b'b']);
        assert_eq!(
            buffer.read_until_zero_unit(2).unwrap_err(),
            CodecError::MissingTerminator { offset: 0 }
        );
    }

    #[test]
    fn test_wide_integers() {
        let mut buffer = CursorBuffer::new();
        buffer.write_u64(u64::MAX - 1, Endian::Little);
        buffer.write_i64(-2, Endian::Big);
        assert_eq!(buffer.read_u64(Endian::Little).unwrap(), u64::MAX - 1);
        assert_eq!(buffer.read_i64(Endian::Big).unwrap(), -2);
    }
}
