//! Repeating a step under a [Repeat] policy.

use std::{fmt, sync::Arc};

use crate::{
    buffer::CursorBuffer,
    errors::CodecError,
    step::{Cursor, Step, required},
    value::{Record, Value},
};

/// What a [Repeat::While] predicate sees before each element.
pub struct RepeatState<'a> {
    /// Index of the element about to be read or written.
    pub index: usize,
    /// Elements decoded so far, or the whole sequence being encoded.
    pub items: &'a [Value],
    pub buffer: &'a CursorBuffer,
}

type RepeatFn = dyn Fn(&RepeatState<'_>) -> bool + Send + Sync;

/// How many times an array repeats its element.
#[derive(Clone)]
pub enum Repeat {
    /// Exactly this many elements.
    Count(usize),
    /// Until the buffer is exhausted (decode) or the sequence ends (encode).
    ToEnd,
    /// While the predicate holds.
    While(Arc<RepeatFn>),
}

impl Repeat {
    pub fn while_fn(f: impl Fn(&RepeatState<'_>) -> bool + Send + Sync + 'static) -> Self {
        Repeat::While(Arc::new(f))
    }
}

impl From<usize> for Repeat {
    fn from(count: usize) -> Self {
        Repeat::Count(count)
    }
}

impl fmt::Debug for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repeat::Count(n) => f.debug_tuple("Count").field(n).finish(),
            Repeat::ToEnd => f.write_str("ToEnd"),
            Repeat::While(_) => f.write_str("While(..)"),
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::RepeatDef> for Repeat {
    fn from(value: crate::serde::RepeatDef) -> Self {
        match value {
            crate::serde::RepeatDef::Count(n) => Repeat::Count(n),
            crate::serde::RepeatDef::ToEnd => Repeat::ToEnd,
        }
    }
}

/// Wraps a step so it decodes to, and encodes from, a [Value::Array].
pub struct ArrayStep {
    inner: Box<dyn Step>,
    repeat: Repeat,
}

impl ArrayStep {
    pub fn new(inner: Box<dyn Step>, repeat: Repeat) -> Self {
        Self { inner, repeat }
    }
}

impl Step for ArrayStep {
    fn decode(&self, cursor: &mut Cursor<'_>, record: &Record) -> Result<Option<Value>, CodecError> {
        let mut items = Vec::new();

        loop {
            let index = items.len();
            let more = match &self.repeat {
                Repeat::Count(n) => index < *n,
                Repeat::ToEnd => cursor.buffer_ref().remaining() > 0,
                Repeat::While(f) => f(&RepeatState {
                    index,
                    items: &items,
                    buffer: cursor.buffer_ref(),
                }),
            };
            if !more {
                break;
            }

            let start = cursor.buffer_ref().read_offset();
            let item = self
                .inner
                .decode(cursor, record)
                .and_then(|item| item.ok_or(CodecError::EmptyElement))
                .map_err(|e| e.in_element(index))?;

            if matches!(self.repeat, Repeat::ToEnd) && cursor.buffer_ref().read_offset() == start {
                return Err(CodecError::NoProgress.in_element(index));
            }

            items.push(item);
        }

        Ok(Some(Value::Array(items)))
    }

    fn encode(
        &self,
        cursor: &mut Cursor<'_>,
        record: &Record,
        value: Option<&Value>,
    ) -> Result<(), CodecError> {
        let items = match required(value)? {
            Value::Array(items) => items,
            other => {
                return Err(CodecError::TypeMismatch {
                    expected: "array",
                    found: other.kind_name(),
                });
            }
        };

        if let Repeat::Count(n) = self.repeat {
            if items.len() != n {
                return Err(CodecError::LengthMismatch {
                    expected: n,
                    actual: items.len(),
                });
            }
        }

        for (index, item) in items.iter().enumerate() {
            if let Repeat::While(f) = &self.repeat {
                let state = RepeatState {
                    index,
                    items,
                    buffer: cursor.buffer_ref(),
                };
                if !f(&state) {
                    break;
                }
            }

            self.inner
                .encode(cursor, record, Some(item))
                .map_err(|e| e.in_element(index))?;
        }

        Ok(())
    }
}
