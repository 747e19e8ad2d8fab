//! VAR-NUMBER codec
//!
//! The NDN-TLV VAR-NUMBER is a self-describing variable-width non-negative
//! integer used for TLV type and length fields. The first byte selects the
//! width:
//!
//! ```text
//! first byte <= 252: the value itself                    (1 byte total)
//! first byte == 253: next 2 bytes, big-endian            (3 bytes total)
//! first byte == 254: next 4 bytes, big-endian            (5 bytes total)
//! first byte == 255: next 8 bytes, big-endian            (9 bytes total)
//! ```
//!
//! Encoding always uses the minimal width that fits the value.

use crate::error::{NdnError, NdnResult};

/// Marker byte for a 2-byte big-endian field
const MARKER_2_BYTES: u8 = 253;
/// Marker byte for a 4-byte big-endian field
const MARKER_4_BYTES: u8 = 254;
/// Marker byte for an 8-byte big-endian field
const MARKER_8_BYTES: u8 = 255;

/// Get the number of bytes the VAR-NUMBER encoding of `value` occupies,
/// including the marker byte where one is needed.
pub fn encoded_size(value: u64) -> usize {
    if value <= 252 {
        1
    } else if value <= 0xffff {
        3
    } else if value <= 0xffff_ffff {
        5
    } else {
        9
    }
}

/// Append the VAR-NUMBER encoding of `value` to `out`.
///
/// The minimal width class is always chosen; a value is never padded to a
/// wider form.
pub fn encode_to(value: u64, out: &mut Vec<u8>) {
    if value <= 252 {
        out.push(value as u8);
    } else if value <= 0xffff {
        out.push(MARKER_2_BYTES);
        out.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value <= 0xffff_ffff {
        out.push(MARKER_4_BYTES);
        out.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        out.push(MARKER_8_BYTES);
        out.extend_from_slice(&value.to_be_bytes());
    }
}

/// Decode a VAR-NUMBER starting at `offset` in `buf`.
///
/// # Returns
/// Returns `Ok((value, bytes_consumed))` if successful.
///
/// # Error Handling
/// Returns error if the buffer ends before the marker byte or before the
/// number of following bytes the marker demands.
pub fn decode(buf: &[u8], offset: usize) -> NdnResult<(u64, usize)> {
    let first = *buf.get(offset).ok_or_else(|| {
        NdnError::TlvDecoding("Buffer exhausted while reading VAR-NUMBER".to_string())
    })?;

    let extra = match first {
        MARKER_2_BYTES => 2,
        MARKER_4_BYTES => 4,
        MARKER_8_BYTES => 8,
        value => return Ok((value as u64, 1)),
    };

    let start = offset + 1;
    let end = start + extra;
    if end > buf.len() {
        return Err(NdnError::TlvDecoding(format!(
            "Buffer exhausted while reading {}-byte VAR-NUMBER field: need {} bytes, have {}",
            extra,
            extra,
            buf.len() - start
        )));
    }

    let mut value = 0u64;
    for &byte in &buf[start..end] {
        value = (value << 8) | (byte as u64);
    }

    Ok((value, 1 + extra))
}
