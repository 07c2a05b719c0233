//! # wirepeek-core
//!
//! A library for inspecting Protocol Buffer wire data without a schema.
//!
//! This crate provides the core functionality for:
//! - Splitting an opaque buffer into `(field, wire type, value)` records
//! - Guessing whether length-delimited payloads are nested messages, text or bytes
//! - Re-encoding the recovered tree back into wire bytes
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`wire`]: Wire types, varints and the byte [`Cursor`]
//! - [`decoder`]: Record-level decoding with leftover recovery
//! - [`classify`]: Nested / text / bytes classification
//! - [`display`]: The [`DisplayMapping`] tree and its JSON rendering
//! - [`encoder`]: Mapping to bytes
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use wirepeek_core::{decode, encode, DisplayValue, WireType};
//!
//! let data = [0x08, 0x96, 0x01, 0x12, 0x03, b'h', b'e', b'y'];
//! let mapping = decode(&data);
//!
//! assert_eq!(mapping.get_one(1), Some(&DisplayValue::Scalar(WireType::Varint, 150)));
//! assert_eq!(mapping.get_one(2).and_then(DisplayValue::as_text), Some("hey"));
//! assert_eq!(encode(&mapping)?, data);
//! # Ok::<(), wirepeek_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod classify;
pub mod decoder;
pub mod display;
pub mod encoder;
pub mod error;
pub mod wire;

// Re-export primary types for convenience
pub use classify::Classifier;
pub use decoder::{DecodeResult, Decoder, DecoderConfig, RawValue, Record};
pub use display::{aggregate, DisplayMapping, DisplayValue, FieldSlot, Rendering};
pub use encoder::{encode, encode_into};
pub use error::{Error, Result};
pub use wire::{Cursor, WireType};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Decodes and classifies `buf` with the default configuration.
///
/// Never fails: malformed input yields fewer fields, and payloads that are
/// neither messages nor UTF-8 become [`DisplayValue::RawBytes`].
pub fn decode(buf: &[u8]) -> DisplayMapping {
    Decoder::new().display(buf)
}

/// Splits `buf` into records and leftover bytes with the default configuration
pub fn decode_records(buf: &[u8]) -> DecodeResult<'_> {
    Decoder::new().decode(buf)
}
