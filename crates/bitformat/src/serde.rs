//! JSON-deserializable schema description.
//!
//! These types describe a schema as data, for example a layout file shipped
//! next to an application, and compile into a [crate::schema::Schema] through
//! `Schema::try_from`, which runs the same builder calls (and raises the same
//! [crate::errors::SchemaError]s) as declaring the fields in code.
//!
//! ```json
//! {
//!   "endianness": "little",
//!   "fields": [
//!     { "name": "count", "type": "numeric", "kind": "u8" },
//!     { "name": "flags", "type": "bits", "width": 8 },
//!     { "name": "label", "type": "string", "length": "null_terminated" },
//!     { "name": "samples", "type": "numeric", "kind": "i16", "array": ["to_end"] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Top-level schema definition.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchemaDef {
    /// `"big"` or `"little"`; big-endian when absent. Applies to every numeric
    /// and bit field that does not name its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endianness: Option<String>,
    /// Fields in wire order.
    pub fields: Vec<FieldDef>,
}

/// One named field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    /// Becomes the key in decoded records.
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKindDef,
    /// Array wrappers, innermost first. Two entries make an array of arrays.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub array: Vec<RepeatDef>,
}

/// What a field holds, selected by its `type` key.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKindDef {
    Numeric {
        kind: NumberKindDef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endianness: Option<String>,
    },
    Wide {
        kind: WideKindDef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endianness: Option<String>,
    },
    Bits {
        width: u32,
    },
    String {
        length: LengthDef,
        #[serde(default)]
        encoding: EncodingDef,
    },
    Bytes {
        length: LengthDef,
    },
    ByteArray {
        length: LengthDef,
    },
    /// A sub-schema decoded into a nested record.
    Nested {
        schema: SchemaDef,
    },
    /// A sub-schema picked by the value of an earlier sibling field.
    Choice {
        discriminant: String,
        options: Vec<ChoiceOptionDef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<SchemaDef>,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum NumberKindDef {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum WideKindDef {
    I64,
    U64,
}

/// Either a byte count or one of `"to_end"` / `"null_terminated"`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(untagged)]
pub enum LengthDef {
    Fixed(usize),
    Mode(LengthModeDef),
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum LengthModeDef {
    ToEnd,
    NullTerminated,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default)]
pub enum EncodingDef {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "ascii")]
    Ascii,
    #[serde(rename = "latin1")]
    Latin1,
    #[serde(rename = "utf-16le")]
    Utf16Le,
}

/// `{"count": n}` or `"to_end"`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum RepeatDef {
    Count(usize),
    ToEnd,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChoiceOptionDef {
    pub key: ChoiceKeyDef,
    pub schema: SchemaDef,
}

/// A JSON number or string. A string holding a decimal integer is the same key
/// as that number.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum ChoiceKeyDef {
    Number(i64),
    Name(String),
}
