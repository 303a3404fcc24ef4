//! # **ArrowType Module** - *Logical type tags and format-string mapping*
//!
//! Maps each supported logical type to its Arrow C Data Interface format
//! string and back.
//!
//! ## Behaviour
//! - The mapping is a pair of static `match` tables, fixed at compile time
//!   and never mutated, so lookups are safe from any thread.
//! - `from_format` is the single entry point the importer uses to decide
//!   whether a foreign schema is supported.
//!
//! ## Interop
//! Format strings follow the published C Data Interface encoding:
//! <https://arrow.apache.org/docs/format/CDataInterface.html#data-type-description-format-strings>

use std::ffi::CStr;

use crate::enums::error::BridgeError;

/// Logical type tag for an exchanged array.
///
/// Covers the primitive, fixed-width types this crate transports. Each
/// variant has exactly one Arrow C format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowType {
    Boolean,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl ArrowType {
    /// Arrow C format string for this type.
    ///
    /// Static storage: the exported `ArrowSchema.format` pointer may alias
    /// this for the life of the process.
    pub fn format(&self) -> &'static CStr {
        match self {
            ArrowType::Boolean => c"b",
            ArrowType::Int32 => c"i",
            ArrowType::UInt32 => c"I",
            ArrowType::Int64 => c"l",
            ArrowType::UInt64 => c"L",
            ArrowType::Float32 => c"f",
            ArrowType::Float64 => c"g",
        }
    }

    /// Parses an Arrow C format string into a type tag.
    pub fn from_format(fmt: &CStr) -> Result<Self, BridgeError> {
        match fmt.to_bytes() {
            b"b" => Ok(ArrowType::Boolean),
            b"i" => Ok(ArrowType::Int32),
            b"I" => Ok(ArrowType::UInt32),
            b"l" => Ok(ArrowType::Int64),
            b"L" => Ok(ArrowType::UInt64),
            b"f" => Ok(ArrowType::Float32),
            b"g" => Ok(ArrowType::Float64),
            other => Err(BridgeError::TypeUnsupported(format!(
                "no type mapping for format string {:?}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    /// Width of one element in the values buffer, or `None` for bit-packed
    /// Boolean data.
    pub fn byte_width(&self) -> Option<usize> {
        match self {
            ArrowType::Boolean => None,
            ArrowType::Int32 | ArrowType::UInt32 | ArrowType::Float32 => Some(4),
            ArrowType::Int64 | ArrowType::UInt64 | ArrowType::Float64 => Some(8),
        }
    }
}
