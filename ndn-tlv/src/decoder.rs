//! TLV decoder
//!
//! This module provides decoding of NDN-TLV elements from a byte buffer.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use ndn_tlv::TlvDecoder;
//!
//! let mut decoder = TlvDecoder::new(&data);
//! let end_offset = decoder.read_nested_tlvs_start(TYPE_PACKET)?;
//! let name = decoder.read_blob_tlv(TYPE_NAME)?;
//! let freshness = decoder.read_optional_non_negative_integer_tlv(TYPE_FRESHNESS, end_offset)?;
//! decoder.finish_nested_tlvs(end_offset, false)?;
//! ```

use crate::error::{NdnError, NdnResult};
use crate::var_number;

/// TLV decoder over an immutable input buffer
///
/// The decoder maintains an offset that advances as elements are decoded,
/// allowing sequential decoding of nested TLVs from the same buffer.
///
/// # Offset Invariant
///
/// `0 <= offset <= input.len()` at all times. Every read advances the
/// offset by exactly the number of bytes it consumed; a failed read returns
/// the error without moving the offset.
///
/// # Buffer Aliasing
///
/// Blob reads return slices that alias the input buffer, never copies. A
/// caller that needs the bytes beyond the input's lifetime must copy them
/// (e.g. into an `ndn_core::Blob`).
pub struct TlvDecoder<'a> {
    input: &'a [u8],
    offset: usize,
}

/// A TLV type is critical when an unrecognized occurrence must abort
/// parsing instead of being skipped: the low type range and all odd types.
fn is_critical_type(tlv_type: u64) -> bool {
    tlv_type <= 31 || tlv_type & 1 == 1
}

impl<'a> TlvDecoder<'a> {
    /// Create a new TLV decoder
    ///
    /// # Arguments
    /// * `input` - Buffer containing TLV-encoded data
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    /// Get the current offset into the input buffer
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Set the offset for reading the next TLV
    ///
    /// # Error Handling
    /// Returns error if `offset` is past the end of the input.
    pub fn seek(&mut self, offset: usize) -> NdnResult<()> {
        if offset > self.input.len() {
            return Err(NdnError::TlvDecoding(format!(
                "Seek target {} is past the end of the {}-byte input",
                offset,
                self.input.len()
            )));
        }
        self.offset = offset;
        Ok(())
    }

    /// Get an aliasing slice of the input between two offsets
    ///
    /// Used by callers that need the exact wire bytes of a sub-element, for
    /// example the signed portion of a packet.
    pub fn slice(&self, begin: usize, end: usize) -> NdnResult<&'a [u8]> {
        if begin > end || end > self.input.len() {
            return Err(NdnError::TlvDecoding(format!(
                "Invalid slice range {}..{} for a {}-byte input",
                begin,
                end,
                self.input.len()
            )));
        }
        Ok(&self.input[begin..end])
    }

    /// Decode a VAR-NUMBER at the current offset and advance past it
    pub fn read_var_number(&mut self) -> NdnResult<u64> {
        let (value, consumed) = var_number::decode(self.input, self.offset)?;
        self.offset += consumed;
        Ok(value)
    }

    /// Decode the type and length at the current offset
    ///
    /// # Arguments
    /// * `expected_type` - The TLV type the element must have
    ///
    /// # Returns
    /// Returns the value length; the offset now points at the first value
    /// byte.
    ///
    /// # Error Handling
    /// Returns error, without moving the offset, if the decoded type differs
    /// from `expected_type` or the declared length extends past the end of
    /// the input.
    pub fn read_type_and_length(&mut self, expected_type: u64) -> NdnResult<usize> {
        let (tlv_type, type_size) = var_number::decode(self.input, self.offset)?;
        if tlv_type != expected_type {
            return Err(NdnError::TlvDecoding(format!(
                "Did not get the expected TLV type {}, got {}",
                expected_type, tlv_type
            )));
        }

        let (length, length_size) = var_number::decode(self.input, self.offset + type_size)?;
        let length = usize::try_from(length).map_err(|_| {
            NdnError::TlvDecoding(format!("TLV length {} is too large", length))
        })?;

        let value_start = self.offset + type_size + length_size;
        match value_start.checked_add(length) {
            Some(end) if end <= self.input.len() => {
                self.offset = value_start;
                Ok(length)
            }
            _ => Err(NdnError::TlvDecoding(format!(
                "TLV length {} exceeds the {} bytes left in the buffer",
                length,
                self.input.len() - value_start
            ))),
        }
    }

    /// Decode the type and length of a structured TLV and return the offset
    /// at which its value ends
    ///
    /// The caller reads any number of optional or repeated children, then
    /// calls [`finish_nested_tlvs`](Self::finish_nested_tlvs) with the
    /// returned end offset.
    pub fn read_nested_tlvs_start(&mut self, expected_type: u64) -> NdnResult<usize> {
        let length = self.read_type_and_length(expected_type)?;
        Ok(self.offset + length)
    }

    /// Skip any remaining TLVs of a nested read and verify the end offset
    ///
    /// # Arguments
    /// * `end_offset` - The parent end offset from `read_nested_tlvs_start`
    /// * `skip_critical` - Whether unrecognized critical types may be skipped
    ///
    /// # Error Handling
    /// Returns error if a skipped TLV has a critical type and
    /// `skip_critical` is false, or if the skipped TLVs do not land exactly
    /// on `end_offset` (the declared parent length does not match its
    /// contents).
    pub fn finish_nested_tlvs(&mut self, end_offset: usize, skip_critical: bool) -> NdnResult<()> {
        while self.offset < end_offset {
            let (tlv_type, type_size) = var_number::decode(self.input, self.offset)?;
            if is_critical_type(tlv_type) && !skip_critical {
                return Err(NdnError::TlvDecoding(format!(
                    "Unrecognized critical TLV type {} while finishing a nested read",
                    tlv_type
                )));
            }

            let (length, length_size) =
                var_number::decode(self.input, self.offset + type_size)?;
            let length = usize::try_from(length).map_err(|_| {
                NdnError::TlvDecoding(format!("TLV length {} is too large", length))
            })?;

            let value_start = self.offset + type_size + length_size;
            match value_start.checked_add(length) {
                Some(end) if end <= self.input.len() => self.offset = end,
                _ => {
                    return Err(NdnError::TlvDecoding(format!(
                        "TLV length {} of a skipped type {} exceeds the buffer",
                        length, tlv_type
                    )));
                }
            }
        }

        if self.offset != end_offset {
            return Err(NdnError::TlvDecoding(
                "The TLV length does not equal the total length of the nested TLVs".to_string(),
            ));
        }
        Ok(())
    }

    /// Check whether the next element has the given type, without consuming
    ///
    /// Returns false when the parent is exhausted (`offset >= end_offset`),
    /// when the next type differs, or when the type field is malformed.
    pub fn peek_type(&self, expected_type: u64, end_offset: usize) -> bool {
        if self.offset >= end_offset {
            return false;
        }
        match var_number::decode(self.input, self.offset) {
            Ok((tlv_type, _)) => tlv_type == expected_type,
            Err(_) => false,
        }
    }

    /// Decode a big-endian non-negative integer of exactly `length` bytes
    ///
    /// # Error Handling
    /// Returns error if `length` is not 1, 2, 4, or 8, or if fewer than
    /// `length` bytes remain.
    pub fn read_non_negative_integer(&mut self, length: usize) -> NdnResult<u64> {
        if !matches!(length, 1 | 2 | 4 | 8) {
            return Err(NdnError::TlvDecoding(format!(
                "Invalid non-negative integer length {} (must be 1, 2, 4, or 8)",
                length
            )));
        }

        let end = self.offset + length;
        if end > self.input.len() {
            return Err(NdnError::TlvDecoding(format!(
                "Buffer exhausted: need {} bytes for a non-negative integer, have {}",
                length,
                self.input.len() - self.offset
            )));
        }

        let mut value = 0u64;
        for &byte in &self.input[self.offset..end] {
            value = (value << 8) | (byte as u64);
        }
        self.offset = end;
        Ok(value)
    }

    /// Decode a TLV of the expected type whose value is a non-negative
    /// integer
    pub fn read_non_negative_integer_tlv(&mut self, expected_type: u64) -> NdnResult<u64> {
        let start = self.offset;
        let result = self
            .read_type_and_length(expected_type)
            .and_then(|length| self.read_non_negative_integer(length));
        if result.is_err() {
            self.offset = start;
        }
        result
    }

    /// Decode a non-negative integer TLV if the next element has the
    /// expected type
    ///
    /// Absence of the optional field is not an error: returns `Ok(None)`
    /// when the parent is exhausted or the next type differs.
    pub fn read_optional_non_negative_integer_tlv(
        &mut self,
        expected_type: u64,
        end_offset: usize,
    ) -> NdnResult<Option<u64>> {
        if self.peek_type(expected_type, end_offset) {
            Ok(Some(self.read_non_negative_integer_tlv(expected_type)?))
        } else {
            Ok(None)
        }
    }

    /// Decode a TLV of the expected type and return its value bytes
    ///
    /// The returned slice aliases the input buffer; it is never a copy.
    pub fn read_blob_tlv(&mut self, expected_type: u64) -> NdnResult<&'a [u8]> {
        let length = self.read_type_and_length(expected_type)?;
        let value = &self.input[self.offset..self.offset + length];
        self.offset += length;
        Ok(value)
    }

    /// Decode a blob TLV if the next element has the expected type
    pub fn read_optional_blob_tlv(
        &mut self,
        expected_type: u64,
        end_offset: usize,
    ) -> NdnResult<Option<&'a [u8]>> {
        if self.peek_type(expected_type, end_offset) {
            Ok(Some(self.read_blob_tlv(expected_type)?))
        } else {
            Ok(None)
        }
    }

    /// Decode a boolean TLV
    ///
    /// A boolean is encoded by presence: if the next element has the
    /// expected type it is consumed (its value bytes, if any, are ignored)
    /// and the result is true; otherwise nothing is consumed and the result
    /// is false.
    pub fn read_boolean_tlv(&mut self, expected_type: u64, end_offset: usize) -> NdnResult<bool> {
        if self.peek_type(expected_type, end_offset) {
            let length = self.read_type_and_length(expected_type)?;
            self.offset += length;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume one TLV of the expected type without interpreting its value
    pub fn skip_tlv(&mut self, expected_type: u64) -> NdnResult<()> {
        let length = self.read_type_and_length(expected_type)?;
        self.offset += length;
        Ok(())
    }

    /// Consume one TLV of the expected type if it is present
    pub fn skip_optional_tlv(&mut self, expected_type: u64, end_offset: usize) -> NdnResult<()> {
        if self.peek_type(expected_type, end_offset) {
            self.skip_tlv(expected_type)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::TlvEncoder;

    #[test]
    fn test_read_type_and_length() {
        // type 5, length 3, value [1, 2, 3]
        let data = [5, 3, 1, 2, 3];
        let mut decoder = TlvDecoder::new(&data);
        let length = decoder.read_type_and_length(5).unwrap();
        assert_eq!(length, 3);
        assert_eq!(decoder.offset(), 2);
    }

    #[test]
    fn test_type_mismatch_leaves_offset_unchanged() {
        let data = [5, 3, 1, 2, 3];
        let mut decoder = TlvDecoder::new(&data);
        assert!(decoder.read_type_and_length(6).is_err());
        assert_eq!(decoder.offset(), 0);
        // The same decoder still reads the correct type afterwards
        assert_eq!(decoder.read_type_and_length(5).unwrap(), 3);
    }

    #[test]
    fn test_length_exceeds_buffer() {
        let data = [5, 10, 1, 2, 3];
        let mut decoder = TlvDecoder::new(&data);
        assert!(decoder.read_type_and_length(5).is_err());
        assert_eq!(decoder.offset(), 0);
    }

    #[test]
    fn test_read_blob_tlv_aliases_input() {
        let data = [7, 4, 0xde, 0xad, 0xbe, 0xef];
        let mut decoder = TlvDecoder::new(&data);
        let value = decoder.read_blob_tlv(7).unwrap();
        assert_eq!(value, &data[2..]);
        assert!(std::ptr::eq(value.as_ptr(), data[2..].as_ptr()));
        assert_eq!(decoder.offset(), data.len());
    }

    #[test]
    fn test_read_non_negative_integer_widths() {
        let data = [
            0x12, // 1 byte
            0x12, 0x34, // 2 bytes
            0x12, 0x34, 0x56, 0x78, // 4 bytes
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, // 8 bytes
        ];
        let mut decoder = TlvDecoder::new(&data);
        assert_eq!(decoder.read_non_negative_integer(1).unwrap(), 0x12);
        assert_eq!(decoder.read_non_negative_integer(2).unwrap(), 0x1234);
        assert_eq!(decoder.read_non_negative_integer(4).unwrap(), 0x12345678);
        assert_eq!(
            decoder.read_non_negative_integer(8).unwrap(),
            0x0102030405060708
        );
    }

    #[test]
    fn test_read_non_negative_integer_invalid_length() {
        let data = [1, 2, 3];
        let mut decoder = TlvDecoder::new(&data);
        assert!(decoder.read_non_negative_integer(3).is_err());
        assert_eq!(decoder.offset(), 0);
    }

    #[test]
    fn test_nested_read_with_optionals() {
        // Encode: parent type 100 containing blob (type 8), integer (type 10)
        let mut encoder = TlvEncoder::new();
        let save_length = encoder.len();
        encoder.write_non_negative_integer_tlv(10, 4000);
        encoder.write_blob_tlv(8, b"abc");
        encoder.write_type_and_length(100, encoder.len() - save_length);
        let wire = encoder.output().to_vec();

        let mut decoder = TlvDecoder::new(&wire);
        let end_offset = decoder.read_nested_tlvs_start(100).unwrap();
        assert_eq!(end_offset, wire.len());
        assert_eq!(decoder.read_blob_tlv(8).unwrap(), b"abc");
        // Optional type 9 is absent
        assert_eq!(
            decoder
                .read_optional_non_negative_integer_tlv(9, end_offset)
                .unwrap(),
            None
        );
        assert_eq!(
            decoder
                .read_optional_non_negative_integer_tlv(10, end_offset)
                .unwrap(),
            Some(4000)
        );
        decoder.finish_nested_tlvs(end_offset, false).unwrap();
        assert_eq!(decoder.offset(), end_offset);
    }

    #[test]
    fn test_finish_nested_tlvs_skips_non_critical() {
        // Parent type 100 contains an unconsumed type 32770 (even, > 31)
        let mut encoder = TlvEncoder::new();
        let save_length = encoder.len();
        encoder.write_blob_tlv(32770, &[9, 9]);
        encoder.write_type_and_length(100, encoder.len() - save_length);
        let wire = encoder.output().to_vec();

        let mut decoder = TlvDecoder::new(&wire);
        let end_offset = decoder.read_nested_tlvs_start(100).unwrap();
        decoder.finish_nested_tlvs(end_offset, false).unwrap();
        assert_eq!(decoder.offset(), wire.len());
    }

    #[test]
    fn test_finish_nested_tlvs_rejects_critical() {
        // Type 33 is odd, so it is critical even though it is > 31
        let mut encoder = TlvEncoder::new();
        let save_length = encoder.len();
        encoder.write_blob_tlv(33, &[1]);
        encoder.write_type_and_length(100, encoder.len() - save_length);
        let wire = encoder.output().to_vec();

        let mut decoder = TlvDecoder::new(&wire);
        let end_offset = decoder.read_nested_tlvs_start(100).unwrap();
        assert!(decoder.finish_nested_tlvs(end_offset, false).is_err());

        // With skip_critical the same element is skipped
        let mut decoder = TlvDecoder::new(&wire);
        let end_offset = decoder.read_nested_tlvs_start(100).unwrap();
        decoder.finish_nested_tlvs(end_offset, true).unwrap();
    }

    #[test]
    fn test_finish_nested_tlvs_length_mismatch() {
        // Parent type 100 declares 4 value bytes: a 3-byte child (type 34,
        // length 1) followed by a stray byte that is a truncated TLV
        let data = [100, 4, 34, 1, 0, 34];
        let mut decoder = TlvDecoder::new(&data);
        let end_offset = decoder.read_nested_tlvs_start(100).unwrap();
        // Skipping the 3-byte child leaves one byte that is a truncated TLV
        assert!(decoder.finish_nested_tlvs(end_offset, true).is_err());
    }

    #[test]
    fn test_read_boolean_tlv() {
        let data = [12, 0, 14, 1, 0xff];
        let mut decoder = TlvDecoder::new(&data);
        assert!(decoder.read_boolean_tlv(12, data.len()).unwrap());
        assert!(!decoder.read_boolean_tlv(13, data.len()).unwrap());
        // Value bytes of a present boolean are consumed and ignored
        assert!(decoder.read_boolean_tlv(14, data.len()).unwrap());
        assert_eq!(decoder.offset(), data.len());
    }

    #[test]
    fn test_skip_tlv() {
        let data = [5, 2, 1, 2, 7, 1, 9];
        let mut decoder = TlvDecoder::new(&data);
        decoder.skip_tlv(5).unwrap();
        decoder.skip_optional_tlv(6, data.len()).unwrap();
        assert_eq!(decoder.read_blob_tlv(7).unwrap(), &[9]);
    }

    #[test]
    fn test_slice_and_seek() {
        let data = [5, 2, 1, 2];
        let mut decoder = TlvDecoder::new(&data);
        decoder.skip_tlv(5).unwrap();
        assert_eq!(decoder.slice(0, decoder.offset()).unwrap(), &data[..]);
        decoder.seek(0).unwrap();
        assert_eq!(decoder.read_type_and_length(5).unwrap(), 2);
        assert!(decoder.seek(100).is_err());
    }

    #[test]
    fn test_multi_byte_type_and_length() {
        // Type 65000 needs the 2-byte VAR-NUMBER form
        let mut encoder = TlvEncoder::new();
        encoder.write_blob_tlv(65000, &[0xab; 300]);
        let wire = encoder.output().to_vec();

        let mut decoder = TlvDecoder::new(&wire);
        let value = decoder.read_blob_tlv(65000).unwrap();
        assert_eq!(value.len(), 300);
        assert!(value.iter().all(|&b| b == 0xab));
    }
}
