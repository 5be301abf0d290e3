//! Sub-byte fields.
//!
//! Consecutive `bits` declarations are collected by a [BitAccumulator] and,
//! once the next byte-aligned field is declared (or the schema compiles),
//! flushed into one [BitFieldStep] per field. All steps of a flushed group
//! share a single [BitCursor] over `total_bits / 8` bytes: the first field
//! of the group creates it, the last one releases it.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use log::trace;

use crate::{
    bits::{BitCursor, MAX_BITS},
    endian::BitOrder,
    errors::{CodecError, SchemaError},
    step::{Cursor, Step, required},
    value::{Record, Value},
};

static NEXT_GROUP_ID: AtomicUsize = AtomicUsize::new(0);

/// Lifecycle of the bit group currently being read or written.
///
/// Lives in the per-call [Cursor], so a compiled schema can be shared between
/// calls. Only one group can be in progress at a time since a group's fields
/// are always contiguous.
#[derive(Debug, Default)]
pub enum BitGroupState {
    #[default]
    NotStarted,
    InProgress { group: usize, bits: BitCursor },
    Done,
}

#[derive(Debug)]
struct PendingBits {
    name: String,
    width: u32,
    bit_order: BitOrder,
}

/// Builder-side collection of bit fields that have not been flushed yet.
#[derive(Debug, Default)]
pub struct BitAccumulator {
    fields: Vec<PendingBits>,
    total_bits: usize,
}

impl BitAccumulator {
    pub fn push(&mut self, name: &str, width: u32, bit_order: BitOrder) -> Result<(), SchemaError> {
        if width == 0 || width > MAX_BITS {
            return Err(SchemaError::InvalidBitWidth {
                field: name.to_string(),
                width,
            });
        }

        self.fields.push(PendingBits {
            name: name.to_string(),
            width,
            bit_order,
        });
        self.total_bits += width as usize;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn total_bits(&self) -> usize {
        self.total_bits
    }

    /// Turns the pending fields into steps sharing one group. Fails unless
    /// the fields add up to whole bytes.
    pub fn flush(self) -> Result<Vec<(String, BitFieldStep)>, SchemaError> {
        if self.total_bits % 8 != 0 {
            return Err(SchemaError::UnalignedBitGroup {
                bits: self.total_bits,
            });
        }

        let group = Arc::new(BitGroup {
            id: NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed),
            byte_len: self.total_bits / 8,
            field_count: self.fields.len(),
        });

        trace!(
            "flushing bit group {} with {} field(s) over {} byte(s)",
            group.id, group.field_count, group.byte_len
        );

        Ok(self
            .fields
            .into_iter()
            .enumerate()
            .map(|(index, field)| {
                let step = BitFieldStep {
                    group: Arc::clone(&group),
                    index,
                    width: field.width,
                    bit_order: field.bit_order,
                };
                (field.name, step)
            })
            .collect())
    }
}

#[derive(Debug)]
struct BitGroup {
    id: usize,
    byte_len: usize,
    field_count: usize,
}

/// One field of a flushed bit group. Decodes to [Value::UInt].
#[derive(Debug)]
pub struct BitFieldStep {
    group: Arc<BitGroup>,
    index: usize,
    width: u32,
    bit_order: BitOrder,
}

impl BitFieldStep {
    fn is_first(&self) -> bool {
        self.index == 0
    }

    fn is_last(&self) -> bool {
        self.index + 1 == self.group.field_count
    }

    /// The group's cursor, if this group is the one in progress.
    fn active<'c>(&self, state: &'c mut BitGroupState) -> Result<&'c mut BitCursor, CodecError> {
        match state {
            BitGroupState::InProgress { group, bits } if *group == self.group.id => {
                bits.set_bit_order(self.bit_order);
                Ok(bits)
            }
            _ => Err(CodecError::BitGroupNotStarted),
        }
    }
}

impl Step for BitFieldStep {
    fn decode(&self, cursor: &mut Cursor<'_>, _record: &Record) -> Result<Option<Value>, CodecError> {
        if self.is_first() {
            let bytes = cursor.buffer().read_bytes(self.group.byte_len)?.to_vec();
            cursor.bits = BitGroupState::InProgress {
                group: self.group.id,
                bits: BitCursor::new(bytes),
            };
        }

        let value = self.active(&mut cursor.bits)?.read_bits(self.width, false)?;

        if self.is_last() {
            cursor.bits = BitGroupState::Done;
        }

        Ok(Some(Value::UInt(value as u64)))
    }

    fn encode(
        &self,
        cursor: &mut Cursor<'_>,
        _record: &Record,
        value: Option<&Value>,
    ) -> Result<(), CodecError> {
        let v = required(value)?.to_integer()?;
        let v = u32::try_from(v)
            .ok()
            .filter(|v| self.width == 32 || *v >> self.width == 0)
            .ok_or_else(|| CodecError::OutOfRange {
                kind: "bit field",
                value: v.to_string(),
            })?;

        if self.is_first() {
            cursor.bits = BitGroupState::InProgress {
                group: self.group.id,
                bits: BitCursor::zeroed(self.group.byte_len),
            };
        }

        self.active(&mut cursor.bits)?.write_bits(v, self.width)?;

        if self.is_last() {
            if let BitGroupState::InProgress { bits, .. } =
                std::mem::replace(&mut cursor.bits, BitGroupState::Done)
            {
                cursor.buffer().write_bytes(&bits.into_bytes());
            }
        }

        Ok(())
    }
}
