//! Forward-only reader over a borrowed byte buffer.

use super::decode_varint;
use crate::error::{Error, Result};
use tracing::debug;

/// Size of a gRPC message header: compression flag + big-endian u32 length
const GRPC_HEADER_LEN: usize = 5;

/// Stateful reader with a single checkpoint slot.
///
/// Reads either succeed and advance, or fail and leave the offset where it
/// was. [`Cursor::rollback`] restores the offset saved by the most recent
/// [`Cursor::checkpoint`].
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    offset: usize,
    saved: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor positioned at the start of `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            saved: 0,
        }
    }

    /// Current read offset
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Returns true if unread bytes remain
    pub fn has_remaining(&self) -> bool {
        self.offset < self.buf.len()
    }

    /// Reads a base-128 varint.
    pub fn read_varint(&mut self) -> Result<u64> {
        let start = self.offset;
        let (value, len) = decode_varint(&self.buf[start..]).map_err(|err| match err {
            Error::VarintOverflow { .. } => Error::varint_overflow(start),
            _ => Error::buffer_underrun(start, self.remaining() + 1, self.remaining()),
        })?;
        self.offset += len;
        Ok(value)
    }

    /// Reads exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(Error::buffer_underrun(self.offset, n, remaining));
        }
        let out = &self.buf[self.offset..self.offset + n];
        self.offset += n;
        Ok(out)
    }

    /// Reads exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Consumes everything that is left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.offset..];
        self.offset = self.buf.len();
        out
    }

    /// Skips a leading gRPC message header if one is plausibly present.
    ///
    /// The header is taken to be present when at least five bytes remain, the
    /// first is `0x00`, and the big-endian length that follows does not exceed
    /// what is left after the header. Returns the announced length when the
    /// header was consumed; otherwise the offset is left untouched.
    pub fn peel_grpc_frame(&mut self) -> Option<u32> {
        let rest = &self.buf[self.offset..];
        if rest.len() < GRPC_HEADER_LEN || rest[0] != 0x00 {
            return None;
        }

        let len = u32::from_be_bytes([rest[1], rest[2], rest[3], rest[4]]);
        if len as usize > rest.len() - GRPC_HEADER_LEN {
            return None;
        }

        debug!("Peeled gRPC frame header announcing {} bytes", len);
        self.offset += GRPC_HEADER_LEN;
        Some(len)
    }

    /// Saves the current offset
    pub fn checkpoint(&mut self) {
        self.saved = self.offset;
    }

    /// Restores the offset saved by the last checkpoint
    pub fn rollback(&mut self) {
        self.offset = self.saved;
    }
}
