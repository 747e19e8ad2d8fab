//! TLV encoder
//!
//! This module provides encoding of NDN-TLV elements into a
//! backward-growing output buffer.
//!
//! # Backward Writing
//!
//! Bytes are written back-to-front: each write places its bytes ending at
//! the current boundary and the boundary moves toward the front of the
//! buffer. A nested length-prefixed structure is therefore written
//! innermost-first: write the value, compute its size as the difference of
//! [`len()`](TlvEncoder::len) before and after, then write the type and
//! length in front of it. No size pre-pass is needed.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use ndn_tlv::TlvEncoder;
//!
//! let mut encoder = TlvEncoder::new();
//! let save_length = encoder.len();
//! encoder.write_blob_tlv(TYPE_NAME, name_bytes);
//! encoder.write_type_and_length(TYPE_PACKET, encoder.len() - save_length);
//! let wire = encoder.into_blob();
//! ```

use crate::var_number;
use bytes::Bytes;
use ndn_core::Blob;

/// Initial backing-store size when none is given
const DEFAULT_CAPACITY: usize = 16;

/// TLV encoder with a backward-growing output buffer
///
/// `output` is the backing store; the `length` bytes at its tail are the
/// encoding written so far, in wire order.
pub struct TlvEncoder {
    output: Vec<u8>,
    length: usize,
}

impl TlvEncoder {
    /// Create a new TLV encoder
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new TLV encoder with the given initial capacity
    ///
    /// The buffer still grows as needed; a good initial estimate avoids the
    /// grow-and-copy steps.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: vec![0; capacity.max(1)],
            length: 0,
        }
    }

    /// Get the number of bytes written so far
    ///
    /// Callers snapshot this before writing a sub-structure and compute the
    /// sub-structure's length by subtraction afterwards.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Check whether anything has been written
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Grow the backing store so that `additional` more bytes fit,
    /// re-seating the written tail at the end of the new store
    fn make_room(&mut self, additional: usize) {
        let needed = self.length + additional;
        if needed <= self.output.len() {
            return;
        }
        let new_size = needed.max(self.output.len() * 2);
        let mut new_output = vec![0u8; new_size];
        let old_tail = self.output.len() - self.length;
        let new_tail = new_size - self.length;
        new_output[new_tail..].copy_from_slice(&self.output[old_tail..]);
        self.output = new_output;
    }

    /// Prepend raw bytes to the output
    pub fn write_buffer(&mut self, buffer: &[u8]) {
        self.make_room(buffer.len());
        self.length += buffer.len();
        let start = self.output.len() - self.length;
        self.output[start..start + buffer.len()].copy_from_slice(buffer);
    }

    /// Prepend the VAR-NUMBER encoding of `value`
    ///
    /// The field is staged front-to-back and then prepended whole, since
    /// the output grows backward.
    pub fn write_var_number(&mut self, value: u64) {
        let mut field = Vec::with_capacity(var_number::encoded_size(value));
        var_number::encode_to(value, &mut field);
        self.write_buffer(&field);
    }

    /// Prepend the type and length of an element whose value was already
    /// written
    pub fn write_type_and_length(&mut self, tlv_type: u64, length: usize) {
        // Length first so it ends up between the type and the value
        self.write_var_number(length as u64);
        self.write_var_number(tlv_type);
    }

    /// Prepend a big-endian non-negative integer using the minimal field
    /// width of 1, 2, 4, or 8 bytes
    pub fn write_non_negative_integer(&mut self, value: u64) {
        if value <= 0xff {
            self.write_buffer(&[value as u8]);
        } else if value <= 0xffff {
            self.write_buffer(&(value as u16).to_be_bytes());
        } else if value <= 0xffff_ffff {
            self.write_buffer(&(value as u32).to_be_bytes());
        } else {
            self.write_buffer(&value.to_be_bytes());
        }
    }

    /// Prepend a TLV whose value is a non-negative integer
    pub fn write_non_negative_integer_tlv(&mut self, tlv_type: u64, value: u64) {
        let save_length = self.length;
        self.write_non_negative_integer(value);
        self.write_type_and_length(tlv_type, self.length - save_length);
    }

    /// Prepend a non-negative integer TLV when the value is present
    ///
    /// Callers encode optional fields unconditionally; `None` writes
    /// nothing.
    pub fn write_optional_non_negative_integer_tlv(&mut self, tlv_type: u64, value: Option<u64>) {
        if let Some(value) = value {
            self.write_non_negative_integer_tlv(tlv_type, value);
        }
    }

    /// Prepend a TLV with the given value bytes
    pub fn write_blob_tlv(&mut self, tlv_type: u64, value: &[u8]) {
        self.write_buffer(value);
        self.write_type_and_length(tlv_type, value.len());
    }

    /// Prepend a blob TLV when the value is present and non-empty
    pub fn write_optional_blob_tlv(&mut self, tlv_type: u64, value: Option<&[u8]>) {
        match value {
            Some(value) if !value.is_empty() => self.write_blob_tlv(tlv_type, value),
            _ => {}
        }
    }

    /// Get the encoding written so far, in wire order
    pub fn output(&self) -> &[u8] {
        &self.output[self.output.len() - self.length..]
    }

    /// Consume the encoder, returning the encoding as a [`Blob`]
    ///
    /// The backing store is handed over and sliced, not copied.
    pub fn into_blob(self) -> Blob {
        let tail = self.output.len() - self.length;
        Blob::from(Bytes::from(self.output).slice(tail..))
    }
}

impl Default for TlvEncoder {
    fn default() -> Self {
        Self::new()
    }
}
