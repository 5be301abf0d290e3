//! Byte order for multi-byte numbers and bit order for sub-byte fields.

use std::{fmt, str::FromStr};

use crate::errors::SchemaError;

/// Byte order of a multi-byte numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Big,
    Little,
}

impl FromStr for Endian {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "big" => Ok(Endian::Big),
            "little" => Ok(Endian::Little),
            other => Err(SchemaError::InvalidEndianness(other.to_string())),
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endian::Big => f.write_str("big"),
            Endian::Little => f.write_str("little"),
        }
    }
}

/// Bit order used when reading or writing a sub-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// Bits are taken from the high end of each byte and assembled MSB first.
    #[default]
    MsbFirst,
    /// Bits are taken from the low end of each byte and assembled LSB first.
    LsbFirst,
}

impl From<Endian> for BitOrder {
    fn from(endian: Endian) -> Self {
        match endian {
            Endian::Big => BitOrder::MsbFirst,
            Endian::Little => BitOrder::LsbFirst,
        }
    }
}
