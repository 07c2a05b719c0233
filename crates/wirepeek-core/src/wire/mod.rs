//! Low-level protobuf wire format primitives.
//!
//! Each protobuf field is encoded as:
//! - A varint "tag" containing the field number and wire type
//! - The field data (format depends on wire type)
//!
//! Wire types understood here:
//! - 0: VARINT (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
//! - 1: I64 (fixed64, sfixed64, double)
//! - 2: LEN (string, bytes, embedded messages, packed repeated fields)
//! - 5: I32 (fixed32, sfixed32, float)
//!
//! The deprecated group wire types (3 and 4) and the unassigned values 6 and 7
//! are rejected.

mod cursor;

use crate::error::{Error, Result};
use bytes::BufMut;
use std::fmt;

pub use cursor::Cursor;

/// Longest possible encoding of a 64-bit varint
pub const MAX_VARINT_LEN: usize = 10;

/// Largest field number that still fits in a 64-bit tag
pub const MAX_FIELD_NUMBER: u64 = u64::MAX >> 3;

/// Protobuf wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 64-bit little-endian fixed-width
    Fixed64 = 1,
    /// Length-prefixed payload (strings, bytes, embedded messages)
    LengthDelimited = 2,
    /// 32-bit little-endian fixed-width
    Fixed32 = 5,
}

impl WireType {
    /// Returns the 3-bit value stored in the low bits of a tag
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Returns a short lowercase name for the wire type
    pub fn as_str(self) -> &'static str {
        match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "len_delim",
            WireType::Fixed32 => "fixed32",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for WireType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            _ => Err(Error::unknown_wire_type(0, value)),
        }
    }
}

/// Builds a tag from a field number and wire type.
pub fn make_tag(field_number: u64, wire_type: WireType) -> Result<u64> {
    if field_number > MAX_FIELD_NUMBER {
        return Err(Error::InvalidFieldNumber {
            number: field_number,
            max: MAX_FIELD_NUMBER,
        });
    }
    Ok((field_number << 3) | u64::from(wire_type.bits()))
}

/// Decode a varint from the given bytes.
///
/// Returns the decoded value and the number of bytes consumed. Errors carry
/// offsets relative to `data`.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;

    for (i, &byte) in data.iter().enumerate() {
        // The tenth byte may only contribute the single remaining bit
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(Error::varint_overflow(0));
        }

        result |= u64::from(byte & 0x7F) << (7 * i);

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(Error::buffer_underrun(data.len(), 1, 0))
}

/// Encode a varint into the buffer.
///
/// Emits 7-bit groups least significant first, setting the continuation bit
/// on every byte but the last.
pub fn encode_varint(mut value: u64, buf: &mut impl BufMut) {
    while value > 0x7F {
        buf.put_u8((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Returns how many bytes [`encode_varint`] writes for `value`
pub fn encoded_len_varint(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}
