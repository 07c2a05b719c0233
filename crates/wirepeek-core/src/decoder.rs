//! Schema-less record decoding.
//!
//! The [`Decoder`] walks a buffer as a flat sequence of `(tag, value)`
//! records. It never fails: the first record that cannot be read completely
//! is rolled back and everything from there on is reported as leftover.
//!
//! ## Byte accounting
//!
//! Record ranges are contiguous and non-overlapping. Together with the
//! leftover bytes they cover the whole input, minus the five header bytes
//! when a gRPC frame was peeled.

use crate::classify::Classifier;
use crate::display::DisplayMapping;
use crate::error::{Error, Result};
use crate::wire::{Cursor, WireType};
use std::ops::Range;
use tracing::{debug, trace};

/// Default nesting depth up to which nested decodes are attempted
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Raw payload of one record, before any classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawValue<'a> {
    /// Varint payload
    Varint(u64),
    /// Eight little-endian bytes, reinterpreted as an unsigned integer
    Fixed64(u64),
    /// Length-prefixed payload
    LengthDelimited(&'a [u8]),
    /// Four little-endian bytes, reinterpreted as an unsigned integer
    Fixed32(u32),
}

impl RawValue<'_> {
    /// Wire type the value was read with
    pub fn wire_type(&self) -> WireType {
        match self {
            RawValue::Varint(_) => WireType::Varint,
            RawValue::Fixed64(_) => WireType::Fixed64,
            RawValue::LengthDelimited(_) => WireType::LengthDelimited,
            RawValue::Fixed32(_) => WireType::Fixed32,
        }
    }
}

/// One decoded field occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    /// Field number taken from the tag
    pub field_number: u64,
    /// Byte range of tag and payload in the decoded buffer
    pub range: Range<usize>,
    /// The payload
    pub value: RawValue<'a>,
}

impl Record<'_> {
    /// Wire type of the record
    pub fn wire_type(&self) -> WireType {
        self.value.wire_type()
    }

    /// Number of bytes the record occupies, tag included
    pub fn encoded_len(&self) -> usize {
        self.range.len()
    }
}

/// Output of a single [`Decoder::decode`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeResult<'a> {
    /// Records in buffer order
    pub records: Vec<Record<'a>>,
    /// Bytes following the last complete record
    pub leftover: &'a [u8],
    /// Length announced by a peeled gRPC header, if one was peeled
    pub frame_len: Option<u32>,
}

impl DecodeResult<'_> {
    /// Returns true if every byte was consumed by a record
    pub fn is_complete(&self) -> bool {
        self.leftover.is_empty()
    }

    /// Total number of input bytes covered by records and leftover
    pub fn consumed_len(&self) -> usize {
        self.records.iter().map(Record::encoded_len).sum::<usize>() + self.leftover.len()
    }
}

/// Configuration for decoding and classification
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Try to skip a gRPC message header before each decode
    pub peel_grpc_frame: bool,
    /// Deepest nesting level at which nested messages are still considered
    pub max_depth: usize,
    /// Reject payloads that are neither nested messages nor UTF-8
    pub strict_text: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            peel_grpc_frame: true,
            max_depth: DEFAULT_MAX_DEPTH,
            strict_text: false,
        }
    }
}

impl DecoderConfig {
    /// Creates a new decoder config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether a leading gRPC header is peeled
    pub fn peel_grpc_frame(mut self, peel: bool) -> Self {
        self.peel_grpc_frame = peel;
        self
    }

    /// Sets the maximum nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets whether non-UTF-8 payloads are an error
    pub fn strict_text(mut self, strict: bool) -> Self {
        self.strict_text = strict;
        self
    }
}

/// Schema-less protobuf decoder
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Creates a new decoder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new decoder with custom configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Returns the decoder configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Splits `buf` into records and leftover bytes.
    pub fn decode<'a>(&self, buf: &'a [u8]) -> DecodeResult<'a> {
        let mut cursor = Cursor::new(buf);
        let frame_len = if self.config.peel_grpc_frame {
            cursor.peel_grpc_frame()
        } else {
            None
        };

        let mut records = Vec::new();
        while cursor.has_remaining() {
            cursor.checkpoint();
            let start = cursor.offset();

            match read_record(&mut cursor) {
                Ok((field_number, value)) => {
                    let range = start..cursor.offset();
                    trace!(
                        "Record field {} ({}) at {}..{}",
                        field_number,
                        value.wire_type(),
                        range.start,
                        range.end
                    );
                    records.push(Record {
                        field_number,
                        range,
                        value,
                    });
                }
                Err(err) => {
                    debug!("Decoding stopped at offset {}: {}", start, err);
                    cursor.rollback();
                    break;
                }
            }
        }

        DecodeResult {
            records,
            leftover: cursor.read_rest(),
            frame_len,
        }
    }

    /// Decodes and classifies `buf` into a display mapping.
    ///
    /// Payloads that are neither nested messages nor UTF-8 become
    /// [`DisplayValue::RawBytes`](crate::DisplayValue::RawBytes), so this
    /// never fails. See [`Decoder::inspect`] for the strict variant.
    pub fn display(&self, buf: &[u8]) -> DisplayMapping {
        let result = self.decode(buf);
        Classifier::new(&self.config).aggregate(&result.records)
    }

    /// Decodes and classifies `buf`, honoring [`DecoderConfig::strict_text`].
    pub fn inspect(&self, buf: &[u8]) -> Result<DisplayMapping> {
        let mapping = self.display(buf);
        if self.config.strict_text {
            mapping.ensure_text()?;
        }
        Ok(mapping)
    }
}

/// Reads one tag and its payload
fn read_record<'a>(cursor: &mut Cursor<'a>) -> Result<(u64, RawValue<'a>)> {
    let tag_offset = cursor.offset();
    let tag = cursor.read_varint()?;
    let field_number = tag >> 3;
    let bits = (tag & 0b111) as u8;
    let wire_type =
        WireType::try_from(bits).map_err(|_| Error::unknown_wire_type(tag_offset, bits))?;

    let value = match wire_type {
        WireType::Varint => RawValue::Varint(cursor.read_varint()?),
        WireType::LengthDelimited => {
            let offset = cursor.offset();
            let len = cursor.read_varint()?;
            let len = usize::try_from(len).map_err(|_| {
                Error::buffer_underrun(offset, usize::MAX, cursor.remaining())
            })?;
            RawValue::LengthDelimited(cursor.read_bytes(len)?)
        }
        WireType::Fixed32 => RawValue::Fixed32(u32::from_le_bytes(cursor.read_array()?)),
        WireType::Fixed64 => RawValue::Fixed64(u64::from_le_bytes(cursor.read_array()?)),
    };

    Ok((field_number, value))
}
