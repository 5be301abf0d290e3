//! Schema: an ordered list of named steps, declared through a [SchemaBuilder].

use std::{collections::HashSet, fmt, sync::Arc};

use log::{debug, trace};

use crate::{
    array::{ArrayStep, Repeat},
    bit_group::BitAccumulator,
    buffer::CursorBuffer,
    choice::{ChoiceStep, ChoiceTable, Discriminant},
    endian::Endian,
    errors::{CodecError, SchemaError},
    field::{Length, NumberKind, WideKind},
    primitive::{ByteArrayStep, BytesStep, NumberStep, StringStep, WideStep},
    step::{Cursor, FnStep, Step, required},
    text::Encoding,
    value::{Record, Value},
};

struct NamedStep {
    name: String,
    step: Box<dyn Step>,
}

macro_rules! numeric_shorthand {
    ($($method:ident => $kind:expr),* $(,)?) => {
        $(
            /// Shorthand for [SchemaBuilder::numeric] using the current default endianness.
            pub fn $method(self, name: &str) -> Result<Self, SchemaError> {
                self.numeric(name, $kind, None)
            }
        )*
    };
}

/// Declares the fields of a [Schema] in order.
///
/// Every declaration consumes the builder and hands it back, so calls chain
/// with `?`. [SchemaBuilder::compile] consumes it for good.
///
/// ```
/// use bitformat::{Length, Schema};
///
/// let schema = Schema::builder()
///     .uint8("version")?
///     .string("name", Length::NullTerminated)?
///     .compile()?;
/// # Ok::<(), bitformat::SchemaError>(())
/// ```
#[derive(Default)]
pub struct SchemaBuilder {
    steps: Vec<NamedStep>,
    names: HashSet<String>,
    bits: BitAccumulator,
    endian: Endian,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endianness used by numeric and bit fields declared from now on.
    /// Fields already declared keep the endianness they were declared with.
    pub fn endianness(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    fn reserve(&mut self, name: &str) -> Result<(), SchemaError> {
        if name.is_empty() {
            return Err(SchemaError::EmptyFieldName);
        }
        if !self.names.insert(name.to_string()) {
            return Err(SchemaError::DuplicateField(name.to_string()));
        }
        Ok(())
    }

    fn flush_bits(&mut self) -> Result<(), SchemaError> {
        if self.bits.is_empty() {
            return Ok(());
        }

        let pending = std::mem::take(&mut self.bits);
        for (name, step) in pending.flush()? {
            self.steps.push(NamedStep {
                name,
                step: Box::new(step),
            });
        }
        Ok(())
    }

    fn push(mut self, name: &str, step: impl Step + 'static) -> Result<Self, SchemaError> {
        self.reserve(name)?;
        self.flush_bits()?;

        trace!("declared field \"{name}\"");
        self.steps.push(NamedStep {
            name: name.to_string(),
            step: Box::new(step),
        });
        Ok(self)
    }

    /// Fixed-width number. `endian` overrides the builder default for this field only.
    pub fn numeric(
        self,
        name: &str,
        kind: NumberKind,
        endian: Option<Endian>,
    ) -> Result<Self, SchemaError> {
        let endian = endian.unwrap_or(self.endian);
        self.push(name, NumberStep { kind, endian })
    }

    numeric_shorthand! {
        uint8 => NumberKind::U8,
        int8 => NumberKind::I8,
        uint16 => NumberKind::U16,
        int16 => NumberKind::I16,
        uint32 => NumberKind::U32,
        int32 => NumberKind::I32,
        float32 => NumberKind::F32,
        float64 => NumberKind::F64,
    }

    /// 64-bit integer.
    pub fn wide(
        self,
        name: &str,
        kind: WideKind,
        endian: Option<Endian>,
    ) -> Result<Self, SchemaError> {
        let endian = endian.unwrap_or(self.endian);
        self.push(name, WideStep { kind, endian })
    }

    pub fn int64(self, name: &str) -> Result<Self, SchemaError> {
        self.wide(name, WideKind::I64, None)
    }

    pub fn uint64(self, name: &str) -> Result<Self, SchemaError> {
        self.wide(name, WideKind::U64, None)
    }

    /// Unsigned field of `width` bits (1 to 32).
    ///
    /// Consecutive bit fields form a group that must add up to whole bytes by
    /// the time the next non-bit field is declared or the schema compiles. The
    /// bit order follows the endianness in effect at this call.
    pub fn bits(mut self, name: &str, width: u32) -> Result<Self, SchemaError> {
        self.reserve(name)?;
        self.bits.push(name, width, self.endian.into())?;
        Ok(self)
    }

    /// UTF-8 string.
    pub fn string(self, name: &str, length: impl Into<Length>) -> Result<Self, SchemaError> {
        self.string_encoded(name, length, Encoding::Utf8)
    }

    pub fn string_encoded(
        self,
        name: &str,
        length: impl Into<Length>,
        encoding: Encoding,
    ) -> Result<Self, SchemaError> {
        let length = length.into();
        self.push(name, StringStep { length, encoding })
    }

    pub fn bytes(self, name: &str, length: impl Into<Length>) -> Result<Self, SchemaError> {
        let length = length.into();
        self.push(name, BytesStep { length })
    }

    /// Like [SchemaBuilder::bytes], but the field is an array of byte values.
    pub fn byte_array(self, name: &str, length: impl Into<Length>) -> Result<Self, SchemaError> {
        let bytes = BytesStep {
            length: length.into(),
        };
        self.push(name, ByteArrayStep { bytes })
    }

    /// Any [Step], including a nested [Schema].
    pub fn custom(self, name: &str, step: impl Step + 'static) -> Result<Self, SchemaError> {
        self.push(name, step)
    }

    /// A field defined by a decode and an encode closure.
    pub fn custom_fn<D, E>(self, name: &str, decode: D, encode: E) -> Result<Self, SchemaError>
    where
        D: Fn(&mut Cursor<'_>, &Record) -> Result<Value, CodecError> + Send + Sync + 'static,
        E: Fn(&mut Cursor<'_>, &Record, &Value) -> Result<(), CodecError> + Send + Sync + 'static,
    {
        self.push(name, FnStep::new(decode, encode))
    }

    /// Turns the most recently declared field into an array of that field.
    pub fn to_array(mut self, repeat: impl Into<Repeat>) -> Result<Self, SchemaError> {
        if !self.bits.is_empty() {
            return Err(SchemaError::ArrayOverBitGroup);
        }

        let last = self.steps.pop().ok_or(SchemaError::NoPreviousField)?;
        let repeat = repeat.into();

        trace!("field \"{}\" repeats {repeat:?}", last.name);
        self.steps.push(NamedStep {
            name: last.name,
            step: Box::new(ArrayStep::new(last.step, repeat)),
        });
        Ok(self)
    }

    /// A field laid out by whichever sub-schema of `table` the discriminant selects.
    pub fn choice(
        self,
        name: &str,
        discriminant: impl Into<Discriminant>,
        table: ChoiceTable,
    ) -> Result<Self, SchemaError> {
        self.push(name, ChoiceStep::new(discriminant.into(), table))
    }

    /// Flushes pending bit fields and freezes the field list.
    pub fn compile(mut self) -> Result<Schema, SchemaError> {
        self.flush_bits()?;

        debug!("compiled schema with {} field(s)", self.steps.len());
        Ok(Schema {
            steps: self.steps.into(),
        })
    }
}

/// A compiled schema. Cheap to clone, and safe to share between threads as
/// long as every call has its own buffer.
#[derive(Clone)]
pub struct Schema {
    steps: Arc<[NamedStep]>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            steps: Arc::from(Vec::new()),
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .finish()
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Decodes a record from the start of `bytes`. Trailing bytes are ignored.
    pub fn decode(&self, bytes: &[u8]) -> Result<Record, CodecError> {
        let mut buffer = CursorBuffer::from_bytes(bytes);
        self.decode_from(&mut buffer)
    }

    /// Decodes a record starting at the buffer's read offset, leaving the
    /// offset just past the last consumed byte.
    pub fn decode_from(&self, buffer: &mut CursorBuffer) -> Result<Record, CodecError> {
        self.decode_record(&mut Cursor::new(buffer))
    }

    pub fn encode(&self, record: &Record) -> Result<Vec<u8>, CodecError> {
        let mut buffer = CursorBuffer::new();
        self.encode_into(&mut buffer, record)?;
        Ok(buffer.into_vec())
    }

    /// Encodes a record at the buffer's write offset.
    pub fn encode_into(&self, buffer: &mut CursorBuffer, record: &Record) -> Result<(), CodecError> {
        self.encode_record(&mut Cursor::new(buffer), record)
    }

    pub(crate) fn decode_record(&self, cursor: &mut Cursor<'_>) -> Result<Record, CodecError> {
        let mut record = Record::new();

        for field in self.steps.iter() {
            let value = field
                .step
                .decode(cursor, &record)
                .map_err(|e| e.in_field(&field.name))?;

            if let Some(value) = value {
                record.insert(field.name.clone(), value);
            }
        }

        Ok(record)
    }

    pub(crate) fn encode_record(
        &self,
        cursor: &mut Cursor<'_>,
        record: &Record,
    ) -> Result<(), CodecError> {
        for field in self.steps.iter() {
            field
                .step
                .encode(cursor, record, record.get(&field.name))
                .map_err(|e| e.in_field(&field.name))?;
        }

        Ok(())
    }
}

impl Step for Schema {
    fn decode(&self, cursor: &mut Cursor<'_>, _record: &Record) -> Result<Option<Value>, CodecError> {
        self.decode_record(cursor).map(|r| Some(Value::Record(r)))
    }

    fn encode(
        &self,
        cursor: &mut Cursor<'_>,
        _record: &Record,
        value: Option<&Value>,
    ) -> Result<(), CodecError> {
        match required(value)? {
            Value::Record(inner) => self.encode_record(cursor, inner),
            other => Err(CodecError::TypeMismatch {
                expected: "record",
                found: other.kind_name(),
            }),
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<crate::serde::SchemaDef> for Schema {
    type Error = SchemaError;

    fn try_from(def: crate::serde::SchemaDef) -> Result<Self, Self::Error> {
        use crate::{choice::ChoiceKey, serde::FieldKindDef};

        let parse_endian = |token: Option<String>| token.map(|t| t.parse::<Endian>()).transpose();

        let mut builder = Schema::builder();
        if let Some(endian) = parse_endian(def.endianness)? {
            builder = builder.endianness(endian);
        }

        for field in def.fields {
            let name = field.name.as_str();

            builder = match field.kind {
                FieldKindDef::Numeric { kind, endianness } => {
                    builder.numeric(name, kind.into(), parse_endian(endianness)?)?
                }
                FieldKindDef::Wide { kind, endianness } => {
                    builder.wide(name, kind.into(), parse_endian(endianness)?)?
                }
                FieldKindDef::Bits { width } => builder.bits(name, width)?,
                FieldKindDef::String { length, encoding } => {
                    builder.string_encoded(name, Length::from(length), encoding.into())?
                }
                FieldKindDef::Bytes { length } => builder.bytes(name, Length::from(length))?,
                FieldKindDef::ByteArray { length } => {
                    builder.byte_array(name, Length::from(length))?
                }
                FieldKindDef::Nested { schema } => builder.custom(name, Schema::try_from(schema)?)?,
                FieldKindDef::Choice {
                    discriminant,
                    options,
                    default,
                } => {
                    let mut table = ChoiceTable::new();
                    for option in options {
                        let schema = Schema::try_from(option.schema)?;
                        table = table.option(ChoiceKey::from(option.key), schema);
                    }
                    if let Some(default) = default {
                        table = table.with_default(Schema::try_from(default)?);
                    }
                    builder.choice(name, Discriminant::field(discriminant), table)?
                }
            };

            for repeat in field.array {
                builder = builder.to_array(Repeat::from(repeat))?;
            }
        }

        builder.compile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record<const N: usize>(fields: [(&str, Value); N]) -> Record {
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_empty_schema() {
        let schema = Schema::builder().compile().unwrap();
        assert!(schema.is_empty());
        assert_eq!(schema.decode(&[1, 2, 3]), Ok(Record::new()));
        assert_eq!(schema.encode(&Record::new()), Ok(vec![]));
    }

    #[test]
    fn test_field_order() {
        let schema = Schema::builder()
            .uint8("z")
            .and_then(|b| b.bits("a", 4))
            .and_then(|b| b.bits("m", 4))
            .and_then(|b| b.uint16("b"))
            .and_then(|b| b.compile())
            .unwrap();

        assert_eq!(schema.field_names().collect::<Vec<_>>(), ["z", "a", "m", "b"]);
        assert_eq!(schema.len(), 4);
    }

    #[test]
    fn test_duplicate_names() {
        let err = Schema::builder()
            .uint8("a")
            .and_then(|b| b.uint8("a"))
            .err();
        assert_eq!(err, Some(SchemaError::DuplicateField("a".to_string())));

        let err = Schema::builder()
            .bits("flag", 4)
            .and_then(|b| b.uint8("flag"))
            .err();
        assert_eq!(err, Some(SchemaError::DuplicateField("flag".to_string())));
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(
            Schema::builder().uint8("").err(),
            Some(SchemaError::EmptyFieldName)
        );
    }

    #[test]
    fn test_to_array_errors() {
        assert_eq!(
            Schema::builder().to_array(2).err(),
            Some(SchemaError::NoPreviousField)
        );
        assert_eq!(
            Schema::builder()
                .bits("a", 8)
                .and_then(|b| b.to_array(2))
                .err(),
            Some(SchemaError::ArrayOverBitGroup)
        );
    }

    #[test]
    fn test_unaligned_bits() {
        assert_eq!(
            Schema::builder()
                .bits("a", 3)
                .and_then(|b| b.compile())
                .err(),
            Some(SchemaError::UnalignedBitGroup { bits: 3 })
        );
        assert_eq!(
            Schema::builder()
                .bits("a", 3)
                .and_then(|b| b.uint8("b"))
                .err(),
            Some(SchemaError::UnalignedBitGroup { bits: 3 })
        );
    }

    #[test]
    fn test_endianness_captured_per_field() {
        let schema = Schema::builder()
            .endianness(Endian::Little)
            .uint16("a")
            .map(|b| b.endianness(Endian::Big))
            .and_then(|b| b.uint16("b"))
            .and_then(|b| b.numeric("c", NumberKind::U16, Some(Endian::Little)))
            .and_then(|b| b.compile())
            .unwrap();

        let r = record([
            ("a", Value::UInt(1)),
            ("b", Value::UInt(1)),
            ("c", Value::UInt(1)),
        ]);
        let bytes = schema.encode(&r).unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 1, 1, 0]);
        assert_eq!(schema.decode(&bytes), Ok(r));
    }

    #[test]
    fn test_missing_field_path() {
        let schema = Schema::builder()
            .uint8("a")
            .and_then(|b| b.uint8("b"))
            .and_then(|b| b.compile())
            .unwrap();

        let err = schema.encode(&record([("a", Value::UInt(1))])).unwrap_err();
        assert_eq!(err.path(), "b");
        assert_eq!(err.root_cause(), &CodecError::MissingValue);
    }

    #[test]
    fn test_nested_schema() {
        let inner = Schema::builder()
            .uint8("x")
            .and_then(|b| b.uint8("y"))
            .and_then(|b| b.compile())
            .unwrap();
        let schema = Schema::builder()
            .custom("point", inner)
            .and_then(|b| b.to_array(2))
            .and_then(|b| b.compile())
            .unwrap();

        let decoded = schema.decode(&[1, 2, 3, 4]).unwrap();
        let point = |x: u64, y: u64| {
            Value::Record(record([("x", Value::UInt(x)), ("y", Value::UInt(y))]))
        };
        assert_eq!(
            decoded,
            record([("point", Value::Array(vec![point(1, 2), point(3, 4)]))])
        );
        assert_eq!(schema.encode(&decoded), Ok(vec![1, 2, 3, 4]));

        let err = schema.decode(&[1, 2, 3]).unwrap_err();
        assert_eq!(err.path(), "point[1].y");
    }

    #[test]
    fn test_custom_fn_sees_siblings() {
        let schema = Schema::builder()
            .uint8("len")
            .and_then(|b| {
                b.custom_fn(
                    "payload",
                    |cursor, record| {
                        let len = record.get("len").map_or(Ok(0), Value::to_integer)? as usize;
                        Ok(Value::Bytes(cursor.buffer().read_bytes(len)?.to_vec()))
                    },
                    |cursor, _, value| {
                        cursor.buffer().write_bytes(&value.to_byte_vec()?);
                        Ok(())
                    },
                )
            })
            .and_then(|b| b.compile())
            .unwrap();

        assert_eq!(
            schema.decode(&[2, 9, 8, 7]),
            Ok(record([
                ("len", Value::UInt(2)),
                ("payload", Value::Bytes(vec![9, 8]))
            ]))
        );
    }

    #[test]
    fn test_decode_from_advances_buffer() {
        let schema = Schema::builder()
            .uint16("a")
            .and_then(|b| b.compile())
            .unwrap();
        let mut buffer = CursorBuffer::from_bytes(&[0, 1, 0, 2]);

        assert_eq!(
            schema.decode_from(&mut buffer),
            Ok(record([("a", Value::UInt(1))]))
        );
        assert_eq!(
            schema.decode_from(&mut buffer),
            Ok(record([("a", Value::UInt(2))]))
        );
        assert_eq!(buffer.read_offset(), 4);
    }

    #[test]
    fn test_schema_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
    }
}
