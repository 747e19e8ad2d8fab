//! Resumable TLV element boundary detection
//!
//! [`TlvStructureDecoder`] determines the byte offset at which one complete
//! top-level TLV element ends, without assuming the whole element is
//! available. It is driven with the same logical buffer, grown as more
//! bytes arrive; each call resumes exactly where the previous one stopped.

use crate::error::{NdnError, NdnResult};

/// Decoder state
///
/// # State Transitions
/// ```text
/// ReadType -> ReadTypeBytes (extended type field) -> ReadLength
/// ReadType -> ReadLength (one-byte type)
/// ReadLength -> ReadLengthBytes (extended length field) -> ReadValueBytes
/// ReadLength -> ReadValueBytes (one-byte length)
/// ReadValueBytes -> done
/// ```
///
/// Each state suspends (the decoder returns "need more data") when the
/// input runs out before the state's bytes are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ReadType,
    ReadTypeBytes,
    ReadLength,
    ReadLengthBytes,
    ReadValueBytes,
}

/// Resumable state machine that finds the end offset of one TLV element
///
/// The decoder never copies or retains input; it only tracks offsets into
/// whatever buffer the caller passes. Callers must pass the same logical
/// stream each time, from offset 0, with at least as many bytes as the
/// previous call (a growing buffer, never a shrinking one).
pub struct TlvStructureDecoder {
    got_element_end: bool,
    offset: usize,
    state: State,
    /// Width of the pending extended type/length field, in bytes
    field_width: usize,
    /// Declared value length, once the length field has been read
    value_length: usize,
}

/// Number of bytes following a VAR-NUMBER marker byte
fn extended_field_width(marker: u8) -> usize {
    match marker {
        253 => 2,
        254 => 4,
        _ => 8, // 255
    }
}

impl TlvStructureDecoder {
    /// Create a new structure decoder, ready to read an element at offset 0
    pub fn new() -> Self {
        Self {
            got_element_end: false,
            offset: 0,
            state: State::ReadType,
            field_width: 0,
            value_length: 0,
        }
    }

    /// Reset to read a new element at offset 0 of the next buffer
    pub fn reset(&mut self) {
        self.got_element_end = false;
        self.offset = 0;
        self.state = State::ReadType;
        self.field_width = 0;
        self.value_length = 0;
    }

    /// Get the current offset into the logical stream
    ///
    /// Once [`find_element_end`](Self::find_element_end) has returned
    /// `Ok(true)` this is the end offset of the element.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Continue scanning for the element end in `input`
    ///
    /// # Returns
    /// `Ok(true)` once the element's end offset is known, `Ok(false)` when
    /// the available input is exhausted first (supply more bytes and call
    /// again).
    ///
    /// # Error Handling
    /// Returns error when the framing is malformed: a declared value length
    /// that cannot be represented as a buffer offset on this platform.
    pub fn find_element_end(&mut self, input: &[u8]) -> NdnResult<bool> {
        if self.got_element_end {
            // The element end was already found in a previous call
            return Ok(true);
        }

        loop {
            match self.state {
                State::ReadType => {
                    let Some(&first) = input.get(self.offset) else {
                        return Ok(false);
                    };
                    self.offset += 1;
                    if first < 253 {
                        self.state = State::ReadLength;
                    } else {
                        self.field_width = extended_field_width(first);
                        self.state = State::ReadTypeBytes;
                    }
                }
                State::ReadTypeBytes => {
                    if self.offset + self.field_width > input.len() {
                        return Ok(false);
                    }
                    // Only the framing matters here; the type value itself
                    // is left for the element parser
                    self.offset += self.field_width;
                    self.state = State::ReadLength;
                }
                State::ReadLength => {
                    let Some(&first) = input.get(self.offset) else {
                        return Ok(false);
                    };
                    self.offset += 1;
                    if first < 253 {
                        self.value_length = first as usize;
                        self.state = State::ReadValueBytes;
                    } else {
                        self.field_width = extended_field_width(first);
                        self.state = State::ReadLengthBytes;
                    }
                }
                State::ReadLengthBytes => {
                    if self.offset + self.field_width > input.len() {
                        return Ok(false);
                    }
                    let mut length = 0u64;
                    for &byte in &input[self.offset..self.offset + self.field_width] {
                        length = (length << 8) | (byte as u64);
                    }
                    self.value_length = usize::try_from(length).map_err(|_| {
                        NdnError::TlvDecoding(format!(
                            "Element value length {} cannot be represented on this platform",
                            length
                        ))
                    })?;
                    self.offset += self.field_width;
                    self.state = State::ReadValueBytes;
                }
                State::ReadValueBytes => {
                    let end = self.offset.checked_add(self.value_length).ok_or_else(|| {
                        NdnError::TlvDecoding(format!(
                            "Element end offset overflows: {} value bytes at offset {}",
                            self.value_length, self.offset
                        ))
                    })?;
                    if end > input.len() {
                        return Ok(false);
                    }
                    self.offset = end;
                    self.got_element_end = true;
                    return Ok(true);
                }
            }
        }
    }
}

impl Default for TlvStructureDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::TlvEncoder;

    fn encode_element(tlv_type: u64, value: &[u8]) -> Vec<u8> {
        let mut encoder = TlvEncoder::new();
        encoder.write_blob_tlv(tlv_type, value);
        encoder.output().to_vec()
    }

    #[test]
    fn test_whole_element_in_one_call() {
        let wire = encode_element(5, &[1, 2, 3]);
        let mut decoder = TlvStructureDecoder::new();
        assert!(decoder.find_element_end(&wire).unwrap());
        assert_eq!(decoder.offset(), wire.len());
    }

    #[test]
    fn test_incremental_prefixes_match_one_shot() {
        // Multi-byte type and length so every state gets exercised
        let wire = encode_element(65000, &vec![7u8; 300]);

        let mut decoder = TlvStructureDecoder::new();
        for end in 0..wire.len() {
            assert!(
                !decoder.find_element_end(&wire[..end]).unwrap(),
                "premature completion with a {}-byte prefix",
                end
            );
        }
        assert!(decoder.find_element_end(&wire).unwrap());
        assert_eq!(decoder.offset(), wire.len());
    }

    #[test]
    fn test_completion_is_sticky() {
        let wire = encode_element(5, &[1]);
        let mut decoder = TlvStructureDecoder::new();
        assert!(decoder.find_element_end(&wire).unwrap());
        // Calling again with more data does not move the end offset
        let mut longer = wire.clone();
        longer.extend_from_slice(&[9, 9, 9]);
        assert!(decoder.find_element_end(&longer).unwrap());
        assert_eq!(decoder.offset(), wire.len());
    }

    #[test]
    fn test_reset_reads_next_element() {
        let wire = encode_element(5, &[1, 2]);
        let mut decoder = TlvStructureDecoder::new();
        assert!(decoder.find_element_end(&wire).unwrap());
        decoder.reset();
        let next = encode_element(7, &[]);
        assert!(decoder.find_element_end(&next).unwrap());
        assert_eq!(decoder.offset(), next.len());
    }

    #[test]
    fn test_zero_length_element() {
        let wire = [5u8, 0];
        let mut decoder = TlvStructureDecoder::new();
        assert!(decoder.find_element_end(&wire).unwrap());
        assert_eq!(decoder.offset(), 2);
    }

    #[test]
    fn test_empty_input_needs_more_data() {
        let mut decoder = TlvStructureDecoder::new();
        assert!(!decoder.find_element_end(&[]).unwrap());
        assert_eq!(decoder.offset(), 0);
    }
}
