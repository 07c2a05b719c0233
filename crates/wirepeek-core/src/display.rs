//! Classified values and their grouping by field number.
//!
//! A [`DisplayMapping`] is what the decoding pipeline produces and the
//! encoder consumes. Field numbers keep the order of their first occurrence,
//! and repeated occurrences of a field keep buffer order inside their slot.

use crate::classify::Classifier;
use crate::decoder::{DecoderConfig, Record};
use crate::error::{Error, Result};
use crate::wire::WireType;
use bytes::Bytes;
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Classified value of one field occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayValue {
    /// Integer read as varint, fixed32 or fixed64
    Scalar(WireType, u64),
    /// Length-delimited payload holding UTF-8 text
    Text(String),
    /// Length-delimited payload that is neither a message nor UTF-8
    RawBytes(Bytes),
    /// Length-delimited payload that decoded as a message
    Nested(DisplayMapping),
}

impl DisplayValue {
    /// Wire type the value is encoded with
    pub fn wire_type(&self) -> WireType {
        match self {
            DisplayValue::Scalar(wire_type, _) => *wire_type,
            DisplayValue::Text(_) | DisplayValue::RawBytes(_) | DisplayValue::Nested(_) => {
                WireType::LengthDelimited
            }
        }
    }

    /// Returns the integer of a scalar value
    pub fn as_scalar(&self) -> Option<u64> {
        match self {
            DisplayValue::Scalar(_, v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string of a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DisplayValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the mapping of a nested value
    pub fn as_nested(&self) -> Option<&DisplayMapping> {
        match self {
            DisplayValue::Nested(m) => Some(m),
            _ => None,
        }
    }

    fn to_json(&self, rendering: Rendering) -> Value {
        let plain = match self {
            DisplayValue::Scalar(_, v) => Value::from(*v),
            DisplayValue::Text(s) => Value::from(s.as_str()),
            DisplayValue::RawBytes(b) => Value::from(hex::encode(b)),
            DisplayValue::Nested(m) => return m.to_json(rendering),
        };

        match rendering {
            Rendering::Plain => plain,
            Rendering::Typed => {
                let kind = match self {
                    DisplayValue::Scalar(wire_type, _) => wire_type.as_str(),
                    DisplayValue::RawBytes(_) => "bytes",
                    _ => "text",
                };
                let mut object = Map::with_capacity(1);
                object.insert(kind.to_owned(), plain);
                Value::Object(object)
            }
        }
    }
}

/// Values stored under one field number
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSlot {
    /// The field occurred once
    Single(DisplayValue),
    /// The field occurred more than once, in buffer order
    Repeated(Vec<DisplayValue>),
}

impl FieldSlot {
    /// Adds another occurrence, turning a single value into a sequence
    pub fn push(&mut self, value: DisplayValue) {
        let previous = std::mem::replace(self, FieldSlot::Repeated(Vec::new()));
        *self = match previous {
            FieldSlot::Single(first) => FieldSlot::Repeated(vec![first, value]),
            FieldSlot::Repeated(mut values) => {
                values.push(value);
                FieldSlot::Repeated(values)
            }
        };
    }

    /// All occurrences, in order
    pub fn values(&self) -> &[DisplayValue] {
        match self {
            FieldSlot::Single(value) => std::slice::from_ref(value),
            FieldSlot::Repeated(values) => values,
        }
    }

    /// Returns true if the field occurred more than once
    pub fn is_repeated(&self) -> bool {
        matches!(self, FieldSlot::Repeated(_))
    }
}

/// How [`DisplayMapping::to_json`] renders values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rendering {
    /// Wrap each value in an object naming its classification
    #[default]
    Typed,
    /// Emit bare numbers, strings and objects
    Plain,
}

/// Field number to classified values, in first-occurrence order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayMapping {
    fields: IndexMap<u64, FieldSlot>,
}

impl DisplayMapping {
    /// Creates an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an occurrence of `field_number`
    pub fn push(&mut self, field_number: u64, value: DisplayValue) {
        match self.fields.entry(field_number) {
            Entry::Vacant(entry) => {
                entry.insert(FieldSlot::Single(value));
            }
            Entry::Occupied(mut entry) => entry.get_mut().push(value),
        }
    }

    /// Returns the slot for `field_number`
    pub fn get(&self, field_number: u64) -> Option<&FieldSlot> {
        self.fields.get(&field_number)
    }

    /// Returns the value of a field that occurred exactly once
    pub fn get_one(&self, field_number: u64) -> Option<&DisplayValue> {
        match self.get(field_number)? {
            FieldSlot::Single(value) => Some(value),
            FieldSlot::Repeated(_) => None,
        }
    }

    /// Returns every occurrence of `field_number`, empty if absent
    pub fn values(&self, field_number: u64) -> &[DisplayValue] {
        self.get(field_number).map(FieldSlot::values).unwrap_or(&[])
    }

    /// Iterates over fields in first-occurrence order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &FieldSlot)> + '_ {
        self.fields.iter().map(|(number, slot)| (*number, slot))
    }

    /// Number of distinct field numbers
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is present
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fails on the first payload that is neither a message nor UTF-8.
    pub fn ensure_text(&self) -> Result<()> {
        for (field_number, slot) in self.iter() {
            for value in slot.values() {
                match value {
                    DisplayValue::RawBytes(bytes) => {
                        std::str::from_utf8(bytes)
                            .map_err(|e| Error::text_decode(field_number, e))?;
                    }
                    DisplayValue::Nested(nested) => nested.ensure_text()?,
                    DisplayValue::Scalar(..) | DisplayValue::Text(_) => {}
                }
            }
        }
        Ok(())
    }

    /// Renders the mapping as a JSON object keyed by field number.
    ///
    /// Repeated fields become arrays. Raw bytes are rendered as lowercase hex.
    pub fn to_json(&self, rendering: Rendering) -> Value {
        let mut object = Map::with_capacity(self.len());
        for (field_number, slot) in self.iter() {
            let value = match slot {
                FieldSlot::Single(value) => value.to_json(rendering),
                FieldSlot::Repeated(values) => {
                    Value::Array(values.iter().map(|v| v.to_json(rendering)).collect())
                }
            };
            object.insert(field_number.to_string(), value);
        }
        Value::Object(object)
    }
}

impl FromIterator<(u64, DisplayValue)> for DisplayMapping {
    fn from_iter<I: IntoIterator<Item = (u64, DisplayValue)>>(iter: I) -> Self {
        let mut mapping = DisplayMapping::new();
        mapping.extend(iter);
        mapping
    }
}

impl Extend<(u64, DisplayValue)> for DisplayMapping {
    fn extend<I: IntoIterator<Item = (u64, DisplayValue)>>(&mut self, iter: I) {
        for (field_number, value) in iter {
            self.push(field_number, value);
        }
    }
}

/// Classifies and groups records using the default configuration
pub fn aggregate(records: &[Record<'_>]) -> DisplayMapping {
    Classifier::new(&DecoderConfig::default()).aggregate(records)
}
