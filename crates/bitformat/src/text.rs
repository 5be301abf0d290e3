//! Text encodings for string fields.

use crate::errors::CodecError;

/// Character encoding used to turn a string field's bytes into text and back.
///
/// Decoding is strict: bytes that are not valid in the encoding are an error
/// rather than being replaced, so a decoded string always encodes back to the
/// same bytes. Invalid UTF-8 is not decoded lossily. For payloads that may hold
/// arbitrary bytes, use [Encoding::Latin1], which accepts every byte, or a
/// bytes field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// 7-bit ASCII. Every byte must be in `0..=0x7F`.
    Ascii,
    /// ISO-8859-1: each byte is one code point in `0..=0xFF`.
    Latin1,
    /// UTF-16, little-endian code units. A null terminator is one zero code
    /// unit, two bytes wide.
    Utf16Le,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin1",
            Encoding::Utf16Le => "utf-16le",
        }
    }

    /// Bytes per code unit, which is also the width of a null terminator.
    pub fn unit_width(self) -> usize {
        match self {
            Encoding::Utf16Le => 2,
            _ => 1,
        }
    }

    fn invalid(self) -> CodecError {
        CodecError::InvalidText {
            encoding: self.name(),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String, CodecError> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| self.invalid()),
            Encoding::Ascii => {
                if !bytes.is_ascii() {
                    return Err(self.invalid());
                }
                Ok(bytes.iter().map(|b| char::from(*b)).collect())
            }
            Encoding::Latin1 => Ok(bytes.iter().map(|b| char::from(*b)).collect()),
            Encoding::Utf16Le => {
                if bytes.len() % 2 != 0 {
                    return Err(self.invalid());
                }
                let units = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
                char::decode_utf16(units)
                    .collect::<Result<String, _>>()
                    .map_err(|_| self.invalid())
            }
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, CodecError> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Ascii => {
                if !text.is_ascii() {
                    return Err(self.invalid());
                }
                Ok(text.as_bytes().to_vec())
            }
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(c).map_err(|_| self.invalid()))
                .collect(),
            Encoding::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::EncodingDef> for Encoding {
    fn from(value: crate::serde::EncodingDef) -> Self {
        match value {
            crate::serde::EncodingDef::Utf8 => Encoding::Utf8,
            crate::serde::EncodingDef::Ascii => Encoding::Ascii,
            crate::serde::EncodingDef::Latin1 => Encoding::Latin1,
            crate::serde::EncodingDef::Utf16Le => Encoding::Utf16Le,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8() {
        assert_eq!(Encoding::Utf8.decode("héllo".as_bytes()).unwrap(), "héllo");
        assert_eq!(
            Encoding::Utf8.decode(&[0xFF; 4]).unwrap_err(),
            CodecError::InvalidText { encoding: "utf-8" }
        );
    }

    #[test]
    fn test_ascii() {
        assert_eq!(Encoding::Ascii.decode(b"Hello\n").unwrap(), "Hello\n");
        assert!(Encoding::Ascii.decode("Hello❤️".as_bytes()).is_err());
        assert!(Encoding::Ascii.encode("é").is_err());
    }

    #[test]
    fn test_latin1() {
        assert_eq!(Encoding::Latin1.decode(&[0xFF, 0xFF]).unwrap(), "ÿÿ");
        assert_eq!(Encoding::Latin1.encode("ÿÿ").unwrap(), vec![0xFF, 0xFF]);
        assert!(Encoding::Latin1.encode("€").is_err());
    }

    #[test]
    fn test_utf16le() {
        assert_eq!(Encoding::Utf16Le.encode("hi").unwrap(), vec![b'h', 0, b'i', 0]);
        assert_eq!(Encoding::Utf16Le.decode(&[b'h', 0, b'i', 0]).unwrap(), "hi");
        assert!(Encoding::Utf16Le.decode(&[b'h']).is_err());
        assert_eq!(Encoding::Utf16Le.unit_width(), 2);
    }

    #[test]
    fn test_arbitrary_bytes_need_latin1() {
        let payload = [b'o', b'k', 0xC3, 0x28];
        assert!(Encoding::Utf8.decode(&payload).is_err());
        assert_eq!(Encoding::Latin1.decode(&payload).unwrap().chars().count(), 4);
        assert_eq!(Encoding::Utf8.unit_width(), 1);
    }
}
