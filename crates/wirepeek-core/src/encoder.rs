//! Re-serialization of display mappings into wire bytes.
//!
//! Encoding walks fields in mapping order and, inside a repeated slot, in
//! occurrence order. For a buffer that decoded without leftover this yields
//! the original bytes, provided its varints were minimally encoded, no gRPC
//! header was peeled and occurrences of different fields were not
//! interleaved.

use crate::display::{DisplayMapping, DisplayValue};
use crate::error::{Error, Result};
use crate::wire::{encode_varint, make_tag, WireType};
use bytes::{BufMut, BytesMut};

/// Encodes a mapping into a fresh buffer.
pub fn encode(mapping: &DisplayMapping) -> Result<Vec<u8>> {
    let mut buf = BytesMut::new();
    encode_into(mapping, &mut buf)?;
    Ok(Vec::from(buf))
}

/// Appends the encoding of `mapping` to `buf`.
///
/// On error `buf` may hold a partial encoding.
pub fn encode_into(mapping: &DisplayMapping, buf: &mut BytesMut) -> Result<()> {
    for (field_number, slot) in mapping.iter() {
        for value in slot.values() {
            encode_value(field_number, value, buf)?;
        }
    }
    Ok(())
}

fn encode_value(field_number: u64, value: &DisplayValue, buf: &mut BytesMut) -> Result<()> {
    let wire_type = value.wire_type();
    let tag = make_tag(field_number, wire_type)?;

    match value {
        DisplayValue::Scalar(WireType::LengthDelimited, _) => {
            return Err(Error::unsupported_wire_type(field_number, wire_type));
        }
        DisplayValue::Scalar(WireType::Varint, v) => {
            encode_varint(tag, buf);
            encode_varint(*v, buf);
        }
        DisplayValue::Scalar(WireType::Fixed32, v) => {
            let v = u32::try_from(*v)
                .map_err(|_| Error::value_out_of_range(field_number, wire_type, *v))?;
            encode_varint(tag, buf);
            buf.put_u32_le(v);
        }
        DisplayValue::Scalar(WireType::Fixed64, v) => {
            encode_varint(tag, buf);
            buf.put_u64_le(*v);
        }
        DisplayValue::Text(text) => {
            encode_varint(tag, buf);
            put_length_delimited(text.as_bytes(), buf);
        }
        DisplayValue::RawBytes(bytes) => {
            encode_varint(tag, buf);
            put_length_delimited(bytes, buf);
        }
        DisplayValue::Nested(child) => {
            let mut nested = BytesMut::new();
            encode_into(child, &mut nested)?;
            encode_varint(tag, buf);
            put_length_delimited(&nested, buf);
        }
    }

    Ok(())
}

fn put_length_delimited(payload: &[u8], buf: &mut BytesMut) {
    encode_varint(payload.len() as u64, buf);
    buf.put_slice(payload);
}
