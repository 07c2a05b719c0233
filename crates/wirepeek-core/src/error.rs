//! Error types for the wirepeek-core library.
//!
//! Decoding failures (`BufferUnderrun`, `UnknownWireType`, `VarintOverflow`)
//! are raised by the [`Cursor`](crate::wire::Cursor) and recovered inside the
//! decoder loop, where they turn the rest of the buffer into leftover bytes.
//! The remaining variants surface to the caller.

use crate::wire::WireType;
use std::str::Utf8Error;
use thiserror::Error;

/// Result type alias for wirepeek operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all wirepeek operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A read asked for more bytes than the buffer holds
    #[error("buffer underrun at offset {offset}: requested {requested} bytes, {remaining} left")]
    BufferUnderrun {
        /// Offset of the read that failed
        offset: usize,
        /// Number of bytes requested
        requested: usize,
        /// Number of bytes left in the buffer
        remaining: usize,
    },

    /// Tag carried a wire type outside {0, 1, 2, 5}
    #[error("unknown wire type {value} at offset {offset}")]
    UnknownWireType {
        /// Offset of the tag
        offset: usize,
        /// The 3-bit wire type value
        value: u8,
    },

    /// Varint does not fit in 64 bits
    #[error("varint at offset {offset} overflows 64 bits")]
    VarintOverflow {
        /// Offset of the first varint byte
        offset: usize,
    },

    /// Encoder was handed a scalar carrying a wire type it cannot emit
    #[error("field {field_number}: wire type {wire_type} cannot be encoded from a scalar")]
    UnsupportedWireType {
        /// Field the value belongs to
        field_number: u64,
        /// The offending wire type
        wire_type: WireType,
    },

    /// Scalar does not fit the width of its wire type
    #[error("field {field_number}: value {value} does not fit in {wire_type}")]
    ValueOutOfRange {
        /// Field the value belongs to
        field_number: u64,
        /// Wire type the value was to be encoded with
        wire_type: WireType,
        /// The offending value
        value: u64,
    },

    /// Length-delimited payload is neither a nested message nor UTF-8
    #[error("field {field_number}: payload is neither a nested message nor valid UTF-8")]
    TextDecodeFailure {
        /// Field the payload belongs to
        field_number: u64,
        /// Underlying UTF-8 error
        #[source]
        source: Utf8Error,
    },

    /// Field number too large to build a tag from
    #[error("invalid field number {number}: must be at most {max}")]
    InvalidFieldNumber {
        /// The invalid field number
        number: u64,
        /// Largest encodable field number
        max: u64,
    },
}

impl Error {
    /// Creates a new buffer underrun error
    pub fn buffer_underrun(offset: usize, requested: usize, remaining: usize) -> Self {
        Self::BufferUnderrun {
            offset,
            requested,
            remaining,
        }
    }

    /// Creates a new unknown wire type error
    pub fn unknown_wire_type(offset: usize, value: u8) -> Self {
        Self::UnknownWireType { offset, value }
    }

    /// Creates a new varint overflow error
    pub fn varint_overflow(offset: usize) -> Self {
        Self::VarintOverflow { offset }
    }

    /// Creates a new unsupported wire type error
    pub fn unsupported_wire_type(field_number: u64, wire_type: WireType) -> Self {
        Self::UnsupportedWireType {
            field_number,
            wire_type,
        }
    }

    /// Creates a new value out of range error
    pub fn value_out_of_range(field_number: u64, wire_type: WireType, value: u64) -> Self {
        Self::ValueOutOfRange {
            field_number,
            wire_type,
            value,
        }
    }

    /// Creates a new text decode error
    pub fn text_decode(field_number: u64, source: Utf8Error) -> Self {
        Self::TextDecodeFailure {
            field_number,
            source,
        }
    }

    /// Returns true if the decoder loop absorbs this error into leftover bytes
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::BufferUnderrun { .. } | Self::UnknownWireType { .. } | Self::VarintOverflow { .. }
        )
    }
}
