//! Descriptors for the primitive field kinds a schema can declare.

/// Fixed-width numeric field kinds up to 32 bits, plus floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl NumberKind {
    pub fn name(self) -> &'static str {
        match self {
            NumberKind::U8 => "u8",
            NumberKind::I8 => "i8",
            NumberKind::U16 => "u16",
            NumberKind::I16 => "i16",
            NumberKind::U32 => "u32",
            NumberKind::I32 => "i32",
            NumberKind::F32 => "f32",
            NumberKind::F64 => "f64",
        }
    }
}

/// 64-bit integer field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WideKind {
    I64,
    U64,
}

impl WideKind {
    pub fn name(self) -> &'static str {
        match self {
            WideKind::I64 => "i64",
            WideKind::U64 => "u64",
        }
    }
}

/// How many bytes a string or byte-run field occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// Exactly this many bytes.
    Fixed(usize),
    /// Everything up to the end of the buffer.
    ToEnd,
    /// Bytes up to a zero byte, which is consumed but not part of the value.
    NullTerminated,
}

impl From<usize> for Length {
    fn from(n: usize) -> Self {
        Length::Fixed(n)
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::NumberKindDef> for NumberKind {
    fn from(value: crate::serde::NumberKindDef) -> Self {
        use crate::serde::NumberKindDef;

        match value {
            NumberKindDef::U8 => NumberKind::U8,
            NumberKindDef::I8 => NumberKind::I8,
            NumberKindDef::U16 => NumberKind::U16,
            NumberKindDef::I16 => NumberKind::I16,
            NumberKindDef::U32 => NumberKind::U32,
            NumberKindDef::I32 => NumberKind::I32,
            NumberKindDef::F32 => NumberKind::F32,
            NumberKindDef::F64 => NumberKind::F64,
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::WideKindDef> for WideKind {
    fn from(value: crate::serde::WideKindDef) -> Self {
        match value {
            crate::serde::WideKindDef::I64 => WideKind::I64,
            crate::serde::WideKindDef::U64 => WideKind::U64,
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::LengthDef> for Length {
    fn from(value: crate::serde::LengthDef) -> Self {
        use crate::serde::{LengthDef, LengthModeDef};

        match value {
            LengthDef::Fixed(n) => Length::Fixed(n),
            LengthDef::Mode(LengthModeDef::ToEnd) => Length::ToEnd,
            LengthDef::Mode(LengthModeDef::NullTerminated) => Length::NullTerminated,
        }
    }
}
