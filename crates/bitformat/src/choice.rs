//! Fields whose layout is picked at runtime from a table of sub-schemas.

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    errors::CodecError,
    schema::Schema,
    step::{Cursor, Step, required},
    value::{Record, Value},
};

/// Key of a [ChoiceTable] entry.
///
/// Keys compare by their text form: a name that is the canonical decimal form
/// of an `i64` is stored as that number, so `"1"` and `1` are the same key
/// while `"01"` stays a name. Build keys through the `From` impls or
/// [ChoiceKey::from_value] to keep that normalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChoiceKey {
    Name(String),
    Number(i64),
}

impl ChoiceKey {
    fn name(name: String) -> Self {
        match name.parse::<i64>() {
            Ok(number) if number.to_string() == name => ChoiceKey::Number(number),
            _ => ChoiceKey::Name(name),
        }
    }

    /// Key for a discriminant value. Strings and numbers qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(ChoiceKey::name(s.clone())),
            Value::Int(v) => Some(ChoiceKey::Number(*v)),
            Value::UInt(v) => Some(
                i64::try_from(*v)
                    .map(ChoiceKey::Number)
                    .unwrap_or_else(|_| ChoiceKey::Name(v.to_string())),
            ),
            Value::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                Some(ChoiceKey::Number(*v as i64))
            }
            Value::Float(v) if v.is_finite() => Some(ChoiceKey::Name(v.to_string())),
            _ => None,
        }
    }
}

impl From<&str> for ChoiceKey {
    fn from(name: &str) -> Self {
        ChoiceKey::name(name.to_string())
    }
}

impl From<String> for ChoiceKey {
    fn from(name: String) -> Self {
        ChoiceKey::name(name)
    }
}

macro_rules! key_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ChoiceKey {
                fn from(number: $t) -> Self {
                    ChoiceKey::Number(i64::from(number))
                }
            }
        )*
    };
}

key_from_number!(u8, u16, u32, i8, i16, i32, i64);

impl fmt::Display for ChoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceKey::Name(name) => write!(f, "{name:?}"),
            ChoiceKey::Number(number) => write!(f, "{number}"),
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::ChoiceKeyDef> for ChoiceKey {
    fn from(value: crate::serde::ChoiceKeyDef) -> Self {
        match value {
            crate::serde::ChoiceKeyDef::Number(n) => ChoiceKey::Number(n),
            crate::serde::ChoiceKeyDef::Name(name) => ChoiceKey::from(name),
        }
    }
}

type ResolveFn = dyn Fn(&Record) -> Option<ChoiceKey> + Send + Sync;

/// Where a choice field gets its key from.
#[derive(Clone)]
pub enum Discriminant {
    /// A sibling field. A field that is absent, or not yet decoded, resolves
    /// to nothing.
    Field(String),
    /// A function of the record in scope.
    With(Arc<ResolveFn>),
}

impl Discriminant {
    pub fn field(name: impl Into<String>) -> Self {
        Discriminant::Field(name.into())
    }

    pub fn with(f: impl Fn(&Record) -> Option<ChoiceKey> + Send + Sync + 'static) -> Self {
        Discriminant::With(Arc::new(f))
    }

    pub fn resolve(&self, record: &Record) -> Option<ChoiceKey> {
        match self {
            Discriminant::Field(name) => record.get(name).and_then(ChoiceKey::from_value),
            Discriminant::With(f) => f(record),
        }
    }
}

impl From<&str> for Discriminant {
    fn from(name: &str) -> Self {
        Discriminant::field(name)
    }
}

impl fmt::Debug for Discriminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discriminant::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Discriminant::With(_) => f.write_str("With(..)"),
        }
    }
}

/// Sub-schemas by key, with an optional fallback.
#[derive(Debug, Clone, Default)]
pub struct ChoiceTable {
    options: BTreeMap<ChoiceKey, Schema>,
    default: Option<Schema>,
}

impl ChoiceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn option(mut self, key: impl Into<ChoiceKey>, schema: Schema) -> Self {
        self.options.insert(key.into(), schema);
        self
    }

    pub fn with_default(mut self, schema: Schema) -> Self {
        self.default = Some(schema);
        self
    }

    pub fn get(&self, key: &ChoiceKey) -> Option<&Schema> {
        self.options.get(key)
    }

    /// The schema for `key`, falling back to the default.
    pub fn select(&self, key: Option<&ChoiceKey>) -> Option<&Schema> {
        key.and_then(|key| self.get(key))
            .or(self.default.as_ref())
    }
}

/// Decodes to the selected sub-schema's [Value::Record], or leaves the field
/// absent when nothing matches.
#[derive(Debug)]
pub struct ChoiceStep {
    discriminant: Discriminant,
    table: ChoiceTable,
}

impl ChoiceStep {
    pub fn new(discriminant: Discriminant, table: ChoiceTable) -> Self {
        Self {
            discriminant,
            table,
        }
    }

    fn select(&self, record: &Record) -> Option<&Schema> {
        let key = self.discriminant.resolve(record);
        self.table.select(key.as_ref())
    }
}

impl Step for ChoiceStep {
    fn decode(&self, cursor: &mut Cursor<'_>, record: &Record) -> Result<Option<Value>, CodecError> {
        match self.select(record) {
            Some(schema) => Ok(Some(Value::Record(schema.decode_record(cursor)?))),
            None => Ok(None),
        }
    }

    fn encode(
        &self,
        cursor: &mut Cursor<'_>,
        record: &Record,
        value: Option<&Value>,
    ) -> Result<(), CodecError> {
        let Some(schema) = self.select(record) else {
            return Ok(());
        };

        match required(value)? {
            Value::Record(inner) => schema.encode_record(cursor, inner),
            other => Err(CodecError::TypeMismatch {
                expected: "record",
                found: other.kind_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_value() {
        assert_eq!(
            ChoiceKey::from_value(&Value::from("a")),
            Some(ChoiceKey::from("a"))
        );
        assert_eq!(ChoiceKey::from_value(&Value::UInt(1)), Some(ChoiceKey::Number(1)));
        assert_eq!(ChoiceKey::from_value(&Value::Int(-1)), Some(ChoiceKey::Number(-1)));
        assert_eq!(ChoiceKey::from_value(&Value::Float(2.0)), Some(ChoiceKey::Number(2)));
        assert_eq!(
            ChoiceKey::from_value(&Value::Float(2.5)),
            Some(ChoiceKey::from("2.5"))
        );
        assert_eq!(
            ChoiceKey::from_value(&Value::UInt(u64::MAX)),
            Some(ChoiceKey::Name(u64::MAX.to_string()))
        );
        assert_eq!(ChoiceKey::from_value(&Value::Float(f64::NAN)), None);
        assert_eq!(ChoiceKey::from_value(&Value::Bytes(vec![1])), None);
    }

    #[test]
    fn test_numeric_names_match_numbers() {
        assert_eq!(ChoiceKey::from("1"), ChoiceKey::Number(1));
        assert_eq!(ChoiceKey::from("-7"), ChoiceKey::Number(-7));
        assert_eq!(ChoiceKey::from("01"), ChoiceKey::Name("01".to_string()));
        assert_eq!(ChoiceKey::from("+1"), ChoiceKey::Name("+1".to_string()));

        let table = ChoiceTable::new().option(1, Schema::default());
        assert!(table.get(&ChoiceKey::from("1")).is_some());
        assert!(
            ChoiceTable::new()
                .option("2", Schema::default())
                .get(&ChoiceKey::Number(2))
                .is_some()
        );
    }

    #[test]
    fn test_text_tag_selects_numbered_option() {
        let body = Schema::builder()
            .uint8("value")
            .and_then(|b| b.compile())
            .unwrap();
        let schema = Schema::builder()
            .string("tag", 1)
            .and_then(|b| b.choice("body", "tag", ChoiceTable::new().option(1, body)))
            .and_then(|b| b.compile())
            .unwrap();

        let decoded = schema.decode(b"1\x07").unwrap();
        assert_eq!(
            decoded.get("body"),
            Some(&Value::Record(
                [("value".to_string(), Value::UInt(7))].into()
            ))
        );
        assert_eq!(schema.encode(&decoded).unwrap(), b"1\x07");
    }

    #[test]
    fn test_select_default() {
        let table = ChoiceTable::new()
            .option("a", Schema::default())
            .with_default(Schema::default());

        assert!(table.select(Some(&ChoiceKey::from("b"))).is_some());
        assert!(table.select(None).is_some());
        assert!(ChoiceTable::new().select(None).is_none());
    }

    #[test]
    fn test_resolve_field() {
        let mut record = Record::new();
        let discriminant = Discriminant::from("kind");
        assert_eq!(discriminant.resolve(&record), None);

        record.insert("kind".to_string(), Value::UInt(3));
        assert_eq!(discriminant.resolve(&record), Some(ChoiceKey::Number(3)));
    }

    #[test]
    fn test_resolve_with() {
        let discriminant = Discriminant::with(|record| {
            Some(if record.contains_key("x") { "x".into() } else { "y".into() })
        });
        assert_eq!(discriminant.resolve(&Record::new()), Some(ChoiceKey::from("y")));
    }
}
