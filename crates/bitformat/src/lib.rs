//! # bitformat
//!
//! Declarative binary layouts: describe a format once as an ordered list of
//! named fields, then decode bytes into records and encode records back into
//! bytes with the same schema.
//!
//! Fields can be fixed-width numbers in either byte order, 64-bit integers,
//! sub-byte bit fields, strings and byte runs (fixed length, up to the end of
//! the input, or null-terminated), arrays of any field, nested schemas and
//! choices between sub-schemas keyed on an earlier field.
//!
//! ## Example
//!
//! ```
//! use bitformat::{Length, Schema, Value};
//!
//! let schema = Schema::builder()
//!     .bits("version", 4)?
//!     .bits("ihl", 4)?
//!     .uint16("length")?
//!     .string("name", Length::NullTerminated)?
//!     .compile()?;
//!
//! let bytes = [0x45, 0x00, 0x14, b'h', b'i', 0];
//! let record = schema.decode(&bytes)?;
//! assert_eq!(record["version"], Value::UInt(4));
//! assert_eq!(record["ihl"], Value::UInt(5));
//! assert_eq!(record["length"], Value::UInt(20));
//! assert_eq!(record["name"], Value::from("hi"));
//!
//! assert_eq!(schema.encode(&record)?, bytes);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod array;
pub mod bit_group;
pub mod bits;
pub mod buffer;
pub mod choice;
pub mod endian;
pub mod errors;
pub mod field;
pub mod primitive;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod step;
pub mod text;
pub mod value;

pub use array::{Repeat, RepeatState};
pub use bits::BitCursor;
pub use buffer::CursorBuffer;
pub use choice::{ChoiceKey, ChoiceTable, Discriminant};
pub use endian::{BitOrder, Endian};
pub use errors::{CodecError, SchemaError};
pub use field::{Length, NumberKind, WideKind};
pub use schema::{Schema, SchemaBuilder};
pub use step::{Cursor, FnStep, Step};
pub use text::Encoding;
pub use value::{Record, Value};
