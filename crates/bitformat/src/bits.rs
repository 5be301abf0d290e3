//! Sub-byte reads and writes over an owned byte run.
//!
//! Bit positions count from the start of the run. Within a byte, an
//! [BitOrder::MsbFirst] access takes bits from the high end and an
//! [BitOrder::LsbFirst] access from the low end, so a single run may mix both
//! orders between accesses.

use crate::{endian::BitOrder, errors::CodecError};

/// Widest single access, in bits.
pub const MAX_BITS: u32 = 32;

/// A cursor over a byte run that reads or writes a few bits at a time.
#[derive(Debug, Clone)]
pub struct BitCursor {
    data: Vec<u8>,
    bit_pos: usize,
    bit_order: BitOrder,
}

impl BitCursor {
    /// Wraps existing bytes for reading, positioned at bit 0.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            bit_pos: 0,
            bit_order: BitOrder::default(),
        }
    }

    /// A zero-filled run of `len` bytes for writing.
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    pub fn bit_order(&self) -> BitOrder {
        self.bit_order
    }

    /// Changes the bit order used by subsequent accesses.
    pub fn set_bit_order(&mut self, bit_order: BitOrder) {
        self.bit_order = bit_order;
    }

    pub fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Bits left between the cursor and the end of the run.
    pub fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.bit_pos
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn check(&self, n: u32) -> Result<(), CodecError> {
        let available = self.remaining_bits();
        if n > MAX_BITS || n as usize > available {
            return Err(CodecError::BitsOutOfBounds {
                offset: self.bit_pos,
                requested: n,
                available,
            });
        }

        Ok(())
    }

    /// Reads `n` bits (at most 32). With `signed`, the result is sign-extended from bit `n - 1`.
    pub fn read_bits(&mut self, n: u32, signed: bool) -> Result<i64, CodecError> {
        self.check(n)?;

        let mut value = 0u64;
        let mut done = 0u32;

        while done < n {
            let bit_offset = (self.bit_pos % 8) as u32;
            let byte = self.data[self.bit_pos / 8];
            let take = (n - done).min(8 - bit_offset);
            let mask = low_mask(take);

            match self.bit_order {
                BitOrder::MsbFirst => {
                    let part = (byte >> (8 - take - bit_offset)) & mask;
                    value = (value << take) | u64::from(part);
                }
                BitOrder::LsbFirst => {
                    let part = (byte >> bit_offset) & mask;
                    value |= u64::from(part) << done;
                }
            }

            self.bit_pos += take as usize;
            done += take;
        }

        if signed && n > 0 {
            Ok(sign_extend(value, n))
        } else {
            Ok(value as i64)
        }
    }

    /// Writes the low `n` bits of `value` (at most 32).
    pub fn write_bits(&mut self, value: u32, n: u32) -> Result<(), CodecError> {
        self.check(n)?;

        let value = u64::from(value);
        let mut done = 0u32;

        while done < n {
            let bit_offset = (self.bit_pos % 8) as u32;
            let index = self.bit_pos / 8;
            let take = (n - done).min(8 - bit_offset);
            let mask = low_mask(take);

            let (part, shift) = match self.bit_order {
                BitOrder::MsbFirst => (
                    (value >> (n - done - take)) as u8 & mask,
                    8 - bit_offset - take,
                ),
                BitOrder::LsbFirst => ((value >> done) as u8 & mask, bit_offset),
            };

            self.data[index] = (self.data[index] & !(mask << shift)) | (part << shift);

            self.bit_pos += take as usize;
            done += take;
        }

        Ok(())
    }
}

/// Mask with the low `n` bits set, for `n` in `0..=8`.
fn low_mask(n: u32) -> u8 {
    ((1u16 << n) - 1) as u8
}

/// Sign-extends the low `bits` of `value` to a full `i64`. Zero bits yield 0.
pub fn sign_extend(value: u64, bits: u32) -> i64 {
    if bits == 0 {
        return 0;
    }
    if bits >= 64 {
        return value as i64;
    }
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}
