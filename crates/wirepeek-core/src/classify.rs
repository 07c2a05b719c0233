//! Ambiguity resolution for length-delimited payloads.
//!
//! Without a schema a length-delimited payload may be a string, raw bytes or
//! an embedded message. The [`Classifier`] decides with a structural test:
//!
//! 1. An empty payload is empty text.
//! 2. The payload is decoded recursively. It is taken as a nested message if
//!    that decode produced at least one record and left no bytes over.
//! 3. Otherwise it is text if it is valid UTF-8.
//! 4. Otherwise it is kept as raw bytes.
//!
//! Step 2 can misfire: short strings such as `"(A"` happen to be well-formed
//! records (`(` is the tag of field 5, varint; `A` is the value 65). Nothing
//! short of a schema can tell the two apart, so the decision is recorded in
//! the resulting [`DisplayValue`] and the encoder reproduces the bytes either
//! way.

use crate::decoder::{Decoder, DecoderConfig, RawValue, Record};
use crate::display::{DisplayMapping, DisplayValue};
use bytes::Bytes;
use tracing::trace;

/// Turns decoded records into display values
#[derive(Debug, Clone)]
pub struct Classifier<'c> {
    config: &'c DecoderConfig,
    depth: usize,
}

impl<'c> Classifier<'c> {
    /// Creates a classifier for top-level records
    pub fn new(config: &'c DecoderConfig) -> Self {
        Self { config, depth: 0 }
    }

    /// Nesting level of the records this classifier sees
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Classifies a single record.
    pub fn classify(&self, record: &Record<'_>) -> DisplayValue {
        match record.value {
            RawValue::Varint(v) | RawValue::Fixed64(v) => {
                DisplayValue::Scalar(record.wire_type(), v)
            }
            RawValue::Fixed32(v) => DisplayValue::Scalar(record.wire_type(), u64::from(v)),
            RawValue::LengthDelimited(payload) => self.classify_payload(record.field_number, payload),
        }
    }

    /// Aggregates records into a mapping, classifying each one.
    pub fn aggregate(&self, records: &[Record<'_>]) -> DisplayMapping {
        let mut mapping = DisplayMapping::new();
        for record in records {
            mapping.push(record.field_number, self.classify(record));
        }
        mapping
    }

    fn classify_payload(&self, field_number: u64, payload: &[u8]) -> DisplayValue {
        if payload.is_empty() {
            return DisplayValue::Text(String::new());
        }

        if self.depth < self.config.max_depth {
            let inner = Decoder::with_config(self.config.clone()).decode(payload);
            if inner.is_complete() && !inner.records.is_empty() {
                trace!(
                    "Field {}: {} bytes accepted as nested message ({} records)",
                    field_number,
                    payload.len(),
                    inner.records.len()
                );
                return DisplayValue::Nested(self.descend().aggregate(&inner.records));
            }
        } else {
            trace!(
                "Field {}: depth limit {} reached, not trying nested decode",
                field_number,
                self.config.max_depth
            );
        }

        match std::str::from_utf8(payload) {
            Ok(text) => {
                trace!("Field {}: {} bytes classified as text", field_number, payload.len());
                DisplayValue::Text(text.to_owned())
            }
            Err(_) => {
                trace!("Field {}: {} bytes kept as raw bytes", field_number, payload.len());
                DisplayValue::RawBytes(Bytes::copy_from_slice(payload))
            }
        }
    }

    fn descend(&self) -> Self {
        Self {
            config: self.config,
            depth: self.depth + 1,
        }
    }
}
