//! The [Step] trait every field kind implements, and the per-invocation [Cursor] it runs against.

use crate::{
    bit_group::BitGroupState,
    buffer::CursorBuffer,
    errors::CodecError,
    value::{Record, Value},
};

/// Execution state for one decode or encode call.
///
/// Borrows the caller's buffer for the duration of the call and carries the
/// state of whichever bit group is currently being read or written. A
/// compiled schema holds no mutable state of its own, so concurrent calls only
/// need separate cursors.
pub struct Cursor<'a> {
    buffer: &'a mut CursorBuffer,
    pub(crate) bits: BitGroupState,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a mut CursorBuffer) -> Self {
        Self {
            buffer,
            bits: BitGroupState::default(),
        }
    }

    pub fn buffer(&mut self) -> &mut CursorBuffer {
        self.buffer
    }

    pub fn buffer_ref(&self) -> &CursorBuffer {
        self.buffer
    }
}

/// A field's paired decode and encode operations.
///
/// `record` is the record being built (decode) or the full record supplied by
/// the caller (encode) at the schema level the step belongs to, so steps can
/// look at sibling fields. A decode returning `None` leaves the field absent.
pub trait Step: Send + Sync {
    fn decode(&self, cursor: &mut Cursor<'_>, record: &Record) -> Result<Option<Value>, CodecError>;

    fn encode(
        &self,
        cursor: &mut Cursor<'_>,
        record: &Record,
        value: Option<&Value>,
    ) -> Result<(), CodecError>;
}

/// Returns the value or [CodecError::MissingValue].
pub(crate) fn required(value: Option<&Value>) -> Result<&Value, CodecError> {
    value.ok_or(CodecError::MissingValue)
}

/// A step built from a pair of closures.
pub struct FnStep<D, E> {
    decode: D,
    encode: E,
}

impl<D, E> FnStep<D, E>
where
    D: Fn(&mut Cursor<'_>, &Record) -> Result<Value, CodecError> + Send + Sync,
    E: Fn(&mut Cursor<'_>, &Record, &Value) -> Result<(), CodecError> + Send + Sync,
{
    pub fn new(decode: D, encode: E) -> Self {
        Self { decode, encode }
    }
}

impl<D, E> Step for FnStep<D, E>
where
    D: Fn(&mut Cursor<'_>, &Record) -> Result<Value, CodecError> + Send + Sync,
    E: Fn(&mut Cursor<'_>, &Record, &Value) -> Result<(), CodecError> + Send + Sync,
{
    fn decode(&self, cursor: &mut Cursor<'_>, record: &Record) -> Result<Option<Value>, CodecError> {
        (self.decode)(cursor, record).map(Some)
    }

    fn encode(
        &self,
        cursor: &mut Cursor<'_>,
        record: &Record,
        value: Option<&Value>,
    ) -> Result<(), CodecError> {
        (self.encode)(cursor, record, required(value)?)
    }
}
