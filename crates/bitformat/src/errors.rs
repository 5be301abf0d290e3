//! Error types for schema definition and for decoding/encoding records.

use thiserror::Error;

/// Errors produced while declaring fields on a [crate::schema::SchemaBuilder].
///
/// These always indicate a mistake in the schema itself, never in the data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A field with this name was already declared (bit fields included).
    #[error("field \"{0}\" has already been declared")]
    DuplicateField(String),
    /// Field names must not be empty.
    #[error("field name must not be empty")]
    EmptyFieldName,
    /// `to_array` was called before any field was declared.
    #[error("cannot promote to an array: no field has been declared yet")]
    NoPreviousField,
    /// `to_array` was called while bit fields were still pending.
    #[error("cannot promote pending bit fields to an array")]
    ArrayOverBitGroup,
    /// Pending bit fields did not add up to whole bytes.
    #[error("pending bit fields total {bits} bits, bit groups must be a multiple of 8")]
    UnalignedBitGroup { bits: usize },
    /// A bit field width outside `1..=32`.
    #[error("bit field \"{field}\" has width {width}, expected 1..=32")]
    InvalidBitWidth { field: String, width: u32 },
    /// Endianness token other than `big` or `little`.
    #[error("invalid endianness \"{0}\", expected \"little\" or \"big\"")]
    InvalidEndianness(String),
}

/// Errors produced while decoding bytes into a record or encoding a record into bytes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// A read needed more bytes than the buffer holds.
    #[error("unexpected end of input at offset {offset}: needed {needed} byte(s), {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// A null-terminated read reached the end of the buffer without a zero byte.
    #[error("no zero terminator after offset {offset}")]
    MissingTerminator { offset: usize },
    /// A bit access ran past the end of its byte run.
    #[error("cannot access {requested} bit(s) at bit offset {offset}, {available} available")]
    BitsOutOfBounds {
        offset: usize,
        requested: u32,
        available: usize,
    },
    /// A bit field other than the first of its group ran before the group started.
    #[error("bit group has not been started, its fields must run in declaration order")]
    BitGroupNotStarted,
    /// A sequence did not have the declared number of elements.
    #[error("expected an array of length {expected}, got length {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    /// The value supplied for a field has the wrong shape.
    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// A string could not be interpreted as a number.
    #[error("\"{0}\" is not a number")]
    NotANumber(String),
    /// A number does not fit the field's integer domain.
    #[error("value {value} does not fit in {kind}")]
    OutOfRange { kind: &'static str, value: String },
    /// The record has no value for a field that needs one.
    #[error("missing value")]
    MissingValue,
    /// A fixed-length string encodes to more bytes than the field holds.
    #[error("string needs {actual} byte(s) but the field holds {max}")]
    StringTooLong { max: usize, actual: usize },
    /// A null-terminated value contains a zero byte of its own.
    #[error("zero byte at position {position} inside a null-terminated value")]
    InteriorNul { position: usize },
    /// Bytes are not valid text in the field's encoding, or text cannot be encoded.
    #[error("invalid {encoding} text")]
    InvalidText { encoding: &'static str },
    /// An array element decoded to nothing (e.g. an unmatched choice).
    #[error("array element decoded to no value")]
    EmptyElement,
    /// An until-exhausted array element consumed no input.
    #[error("array element consumed no input")]
    NoProgress,
    /// Raised by user-supplied decode/encode functions.
    #[error("{0}")]
    Custom(String),
    /// Error raised inside a named field.
    #[error("field \"{field}\": {source}")]
    Field {
        field: String,
        source: Box<CodecError>,
    },
    /// Error raised inside one element of an array.
    #[error("element {index}: {source}")]
    Element {
        index: usize,
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Wraps the error with the name of the field it occurred in.
    pub fn in_field(self, field: &str) -> Self {
        CodecError::Field {
            field: field.to_string(),
            source: Box::new(self),
        }
    }

    /// Wraps the error with the index of the array element it occurred in.
    pub fn in_element(self, index: usize) -> Self {
        CodecError::Element {
            index,
            source: Box::new(self),
        }
    }

    /// The innermost error, with every field and element wrapper removed.
    pub fn root_cause(&self) -> &CodecError {
        match self {
            CodecError::Field { source, .. } | CodecError::Element { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// Field names and element indices leading to the innermost error, e.g. `header.flags[2]`.
    pub fn path(&self) -> String {
        let mut path = String::new();
        let mut current = self;

        loop {
            match current {
                CodecError::Field { field, source } => {
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(field);
                    current = source;
                }
                CodecError::Element { index, source } => {
                    path.push_str(&format!("[{index}]"));
                    current = source;
                }
                _ => return path,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_and_path() {
        let err = CodecError::MissingValue
            .in_field("flags")
            .in_element(2)
            .in_field("header");

        assert_eq!(err.root_cause(), &CodecError::MissingValue);
        assert_eq!(err.path(), "header[2].flags");
    }

    #[test]
    fn test_display() {
        let err = CodecError::LengthMismatch {
            expected: 4,
            actual: 3,
        }
        .in_field("dst");

        assert_eq!(
            err.to_string(),
            "field \"dst\": expected an array of length 4, got length 3"
        );
    }
}
