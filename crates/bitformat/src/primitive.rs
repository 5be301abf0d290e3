//! Byte-aligned field steps: numbers, 64-bit integers, strings and byte runs.

use crate::{
    buffer::CursorBuffer,
    endian::Endian,
    errors::CodecError,
    field::{Length, NumberKind, WideKind},
    step::{Cursor, Step, required},
    text::Encoding,
    value::{Record, Value},
};

fn out_of_range(kind: &'static str, value: impl ToString) -> CodecError {
    CodecError::OutOfRange {
        kind,
        value: value.to_string(),
    }
}

fn fit<T: TryFrom<i128>>(kind: &'static str, value: &Value) -> Result<T, CodecError> {
    let v = value.to_integer()?;
    T::try_from(v).map_err(|_| out_of_range(kind, v))
}

/// Fixed-width number up to 32 bits, or a float.
#[derive(Debug, Clone, Copy)]
pub struct NumberStep {
    pub kind: NumberKind,
    pub endian: Endian,
}

impl Step for NumberStep {
    fn decode(&self, cursor: &mut Cursor<'_>, _record: &Record) -> Result<Option<Value>, CodecError> {
        let buffer = cursor.buffer();
        let endian = self.endian;

        let value = match self.kind {
            NumberKind::U8 => Value::from(buffer.read_u8()?),
            NumberKind::I8 => Value::from(buffer.read_i8()?),
            NumberKind::U16 => Value::from(buffer.read_u16(endian)?),
            NumberKind::I16 => Value::from(buffer.read_i16(endian)?),
            NumberKind::U32 => Value::from(buffer.read_u32(endian)?),
            NumberKind::I32 => Value::from(buffer.read_i32(endian)?),
            NumberKind::F32 => Value::from(buffer.read_f32(endian)?),
            NumberKind::F64 => Value::from(buffer.read_f64(endian)?),
        };

        Ok(Some(value))
    }

    fn encode(
        &self,
        cursor: &mut Cursor<'_>,
        _record: &Record,
        value: Option<&Value>,
    ) -> Result<(), CodecError> {
        let value = required(value)?;
        let name = self.kind.name();
        let endian = self.endian;

        // Convert before touching the buffer so a bad value writes nothing.
        match self.kind {
            NumberKind::U8 => {
                let v = fit::<u8>(name, value)?;
                cursor.buffer().write_u8(v);
            }
            NumberKind::I8 => {
                let v = fit::<i8>(name, value)?;
                cursor.buffer().write_i8(v);
            }
            NumberKind::U16 => {
                let v = fit::<u16>(name, value)?;
                cursor.buffer().write_u16(v, endian);
            }
            NumberKind::I16 => {
                let v = fit::<i16>(name, value)?;
                cursor.buffer().write_i16(v, endian);
            }
            NumberKind::U32 => {
                let v = fit::<u32>(name, value)?;
                cursor.buffer().write_u32(v, endian);
            }
            NumberKind::I32 => {
                let v = fit::<i32>(name, value)?;
                cursor.buffer().write_i32(v, endian);
            }
            NumberKind::F32 => {
                let v = value.to_float()? as f32;
                cursor.buffer().write_f32(v, endian);
            }
            NumberKind::F64 => {
                let v = value.to_float()?;
                cursor.buffer().write_f64(v, endian);
            }
        }

        Ok(())
    }
}

/// 64-bit signed or unsigned integer.
#[derive(Debug, Clone, Copy)]
pub struct WideStep {
    pub kind: WideKind,
    pub endian: Endian,
}

impl Step for WideStep {
    fn decode(&self, cursor: &mut Cursor<'_>, _record: &Record) -> Result<Option<Value>, CodecError> {
        let buffer = cursor.buffer();
        let value = match self.kind {
            WideKind::I64 => Value::Int(buffer.read_i64(self.endian)?),
            WideKind::U64 => Value::UInt(buffer.read_u64(self.endian)?),
        };

        Ok(Some(value))
    }

    fn encode(
        &self,
        cursor: &mut Cursor<'_>,
        _record: &Record,
        value: Option<&Value>,
    ) -> Result<(), CodecError> {
        let value = required(value)?;
        let name = self.kind.name();

        match self.kind {
            WideKind::I64 => {
                let v = fit::<i64>(name, value)?;
                cursor.buffer().write_i64(v, self.endian);
            }
            WideKind::U64 => {
                let v = fit::<u64>(name, value)?;
                cursor.buffer().write_u64(v, self.endian);
            }
        }

        Ok(())
    }
}

/// Reads a run of `length`. `unit` is the width of a null terminator in bytes.
fn read_run(buffer: &mut CursorBuffer, length: Length, unit: usize) -> Result<Vec<u8>, CodecError> {
    match length {
        Length::Fixed(n) => Ok(buffer.read_bytes(n)?.to_vec()),
        Length::ToEnd => Ok(buffer.read_to_end().to_vec()),
        Length::NullTerminated => Ok(buffer.read_until_zero_unit(unit)?.to_vec()),
    }
}

/// Writes `bytes` followed by `unit` zero bytes. `bytes` must not already hold
/// an all-zero unit.
fn write_terminated(buffer: &mut CursorBuffer, bytes: &[u8], unit: usize) -> Result<(), CodecError> {
    let unit = unit.max(1);
    if let Some(index) = bytes
        .chunks(unit)
        .position(|chunk| chunk.iter().all(|b| *b == 0))
    {
        return Err(CodecError::InteriorNul {
            position: index * unit,
        });
    }

    buffer.write_bytes(bytes);
    buffer.write_zeros(unit);
    Ok(())
}

/// Text field.
///
/// A fixed-length string shorter than its field is padded with zero bytes, and
/// the padding is part of the decoded string. A string longer than its field
/// is an error rather than being cut, since cutting could split a multi-byte
/// character.
#[derive(Debug, Clone, Copy)]
pub struct StringStep {
    pub length: Length,
    pub encoding: Encoding,
}

impl Step for StringStep {
    fn decode(&self, cursor: &mut Cursor<'_>, _record: &Record) -> Result<Option<Value>, CodecError> {
        let bytes = read_run(cursor.buffer(), self.length, self.encoding.unit_width())?;
        Ok(Some(Value::String(self.encoding.decode(&bytes)?)))
    }

    fn encode(
        &self,
        cursor: &mut Cursor<'_>,
        _record: &Record,
        value: Option<&Value>,
    ) -> Result<(), CodecError> {
        let text = match required(value)? {
            Value::String(text) => text,
            other => {
                return Err(CodecError::TypeMismatch {
                    expected: "string",
                    found: other.kind_name(),
                });
            }
        };

        let bytes = self.encoding.encode(text)?;
        let buffer = cursor.buffer();

        match self.length {
            Length::Fixed(n) => {
                if bytes.len() > n {
                    return Err(CodecError::StringTooLong {
                        max: n,
                        actual: bytes.len(),
                    });
                }
                buffer.write_bytes(&bytes);
                buffer.write_zeros(n - bytes.len());
            }
            Length::ToEnd => buffer.write_bytes(&bytes),
            Length::NullTerminated => {
                write_terminated(buffer, &bytes, self.encoding.unit_width())?
            }
        }

        Ok(())
    }
}

/// Raw byte run, decoded as [Value::Bytes].
///
/// Unlike strings, a fixed-length byte run must be supplied with exactly its
/// declared length.
#[derive(Debug, Clone, Copy)]
pub struct BytesStep {
    pub length: Length,
}

impl BytesStep {
    fn write(&self, buffer: &mut CursorBuffer, bytes: &[u8]) -> Result<(), CodecError> {
        match self.length {
            Length::Fixed(n) => {
                if bytes.len() != n {
                    return Err(CodecError::LengthMismatch {
                        expected: n,
                        actual: bytes.len(),
                    });
                }
                buffer.write_bytes(bytes);
            }
            Length::ToEnd => buffer.write_bytes(bytes),
            Length::NullTerminated => write_terminated(buffer, bytes, 1)?,
        }

        Ok(())
    }
}

impl Step for BytesStep {
    fn decode(&self, cursor: &mut Cursor<'_>, _record: &Record) -> Result<Option<Value>, CodecError> {
        Ok(Some(Value::Bytes(read_run(cursor.buffer(), self.length, 1)?)))
    }

    fn encode(
        &self,
        cursor: &mut Cursor<'_>,
        _record: &Record,
        value: Option<&Value>,
    ) -> Result<(), CodecError> {
        let bytes = required(value)?.to_byte_vec()?;
        self.write(cursor.buffer(), &bytes)
    }
}

/// Byte run decoded as an array of small unsigned integers instead of [Value::Bytes].
#[derive(Debug, Clone, Copy)]
pub struct ByteArrayStep {
    pub bytes: BytesStep,
}

impl Step for ByteArrayStep {
    fn decode(&self, cursor: &mut Cursor<'_>, _record: &Record) -> Result<Option<Value>, CodecError> {
        let bytes = read_run(cursor.buffer(), self.bytes.length, 1)?;
        Ok(Some(Value::Array(bytes.into_iter().map(Value::from).collect())))
    }

    fn encode(
        &self,
        cursor: &mut Cursor<'_>,
        record: &Record,
        value: Option<&Value>,
    ) -> Result<(), CodecError> {
        match required(value)? {
            Value::Array(_) => self.bytes.encode(cursor, record, value),
            other => Err(CodecError::TypeMismatch {
                expected: "array",
                found: other.kind_name(),
            }),
        }
    }
}
