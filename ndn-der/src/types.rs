//! DER tag classification and length codec
//!
//! # Tag Encoding
//!
//! The single tag byte identifies the node type. Bit 5 (0x20) marks a
//! constructed type whose value is a concatenation of child TLVs; the only
//! constructed type this codec supports is SEQUENCE (0x30).
//!
//! # Length Encoding
//!
//! ```text
//! Short form (length <= 127):  0 L L L L L L L
//! Long form  (length >= 128):  1 N N N N N N N, then N big-endian bytes
//! ```
//!
//! Only the strict DER subset is produced and accepted: definite lengths,
//! minimal width. The indefinite form (first byte 0x80) and long forms
//! that could have been shorter are decoding errors.

use crate::error::{NdnError, NdnResult};

/// Bit 5 of the tag byte marks a constructed type
const CONSTRUCTED_BIT: u8 = 0x20;

/// DER node type
///
/// The supported universal types, plus [`Generic`](DerNodeType::Generic)
/// carrying the raw tag byte of any other primitive type so unknown
/// primitives survive a decode/encode round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerNodeType {
    Boolean,
    Integer,
    BitString,
    OctetString,
    Null,
    ObjectIdentifier,
    Sequence,
    PrintableString,
    GeneralizedTime,
    /// Any other tag, kept as an uninterpreted byte string
    Generic(u8),
}

impl DerNodeType {
    /// Classify a raw tag byte
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0x01 => DerNodeType::Boolean,
            0x02 => DerNodeType::Integer,
            0x03 => DerNodeType::BitString,
            0x04 => DerNodeType::OctetString,
            0x05 => DerNodeType::Null,
            0x06 => DerNodeType::ObjectIdentifier,
            0x13 => DerNodeType::PrintableString,
            0x18 => DerNodeType::GeneralizedTime,
            0x30 => DerNodeType::Sequence,
            other => DerNodeType::Generic(other),
        }
    }

    /// Get the tag byte
    pub fn tag(self) -> u8 {
        match self {
            DerNodeType::Boolean => 0x01,
            DerNodeType::Integer => 0x02,
            DerNodeType::BitString => 0x03,
            DerNodeType::OctetString => 0x04,
            DerNodeType::Null => 0x05,
            DerNodeType::ObjectIdentifier => 0x06,
            DerNodeType::PrintableString => 0x13,
            DerNodeType::GeneralizedTime => 0x18,
            DerNodeType::Sequence => 0x30,
            DerNodeType::Generic(tag) => tag,
        }
    }

    /// Check whether the tag has the constructed bit set
    pub fn is_constructed(self) -> bool {
        self.tag() & CONSTRUCTED_BIT != 0
    }
}

/// Get the number of bytes the DER length encoding of `length` occupies
pub fn encoded_length_size(length: usize) -> usize {
    if length <= 127 {
        1
    } else {
        1 + length_field_width(length)
    }
}

/// Number of big-endian bytes needed for a long-form length value
fn length_field_width(length: usize) -> usize {
    let mut width = 0;
    let mut remaining = length;
    while remaining > 0 {
        width += 1;
        remaining >>= 8;
    }
    width
}

/// Append the DER length encoding of `length` to `out`
pub fn encode_length(length: usize, out: &mut Vec<u8>) {
    if length <= 127 {
        out.push(length as u8);
        return;
    }
    let width = length_field_width(length);
    out.push(0x80 | width as u8);
    for i in (0..width).rev() {
        out.push(((length >> (i * 8)) & 0xff) as u8);
    }
}

/// Decode a DER length starting at `offset` in `buf`
///
/// # Returns
/// Returns `Ok((length, bytes_consumed))` if successful.
///
/// # Error Handling
/// Returns error on truncation, on the indefinite form (0x80), on a length
/// field wider than this platform can address, and on non-minimal long
/// forms (a leading zero byte, or a long form for a value below 128).
pub fn decode_length(buf: &[u8], offset: usize) -> NdnResult<(usize, usize)> {
    let first = *buf.get(offset).ok_or_else(|| {
        NdnError::DerDecoding("Buffer exhausted while reading DER length".to_string())
    })?;

    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let width = (first & 0x7f) as usize;
    if width == 0 {
        return Err(NdnError::DerDecoding(
            "Indefinite length encoding is not DER".to_string(),
        ));
    }
    if width > std::mem::size_of::<usize>() {
        return Err(NdnError::DerDecoding(format!(
            "DER length field of {} bytes is too large for this platform",
            width
        )));
    }

    let start = offset + 1;
    let end = start + width;
    if end > buf.len() {
        return Err(NdnError::DerDecoding(format!(
            "Buffer exhausted while reading a {}-byte DER length field",
            width
        )));
    }

    if buf[start] == 0 {
        return Err(NdnError::DerDecoding(
            "Non-minimal DER length encoding: leading zero byte".to_string(),
        ));
    }

    let mut length = 0usize;
    for &byte in &buf[start..end] {
        length = (length << 8) | (byte as usize);
    }
    if length <= 127 {
        return Err(NdnError::DerDecoding(format!(
            "Non-minimal DER length encoding: long form used for length {}",
            length
        )));
    }

    Ok((length, 1 + width))
}
