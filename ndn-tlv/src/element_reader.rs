//! Streaming element reader
//!
//! [`ElementReader`] is the front end between a byte-stream transport and
//! the TLV parsers: the transport calls
//! [`on_received_data`](ElementReader::on_received_data) with each chunk as
//! it arrives, and the reader invokes its listener once per complete
//! top-level element, in arrival order.

use crate::error::NdnResult;
use crate::structure_decoder::TlvStructureDecoder;
use bytes::{Buf, BytesMut};
use log::{trace, warn};

/// Receiver of complete TLV elements
///
/// The element slice is only valid during the call; the listener must copy
/// anything it needs to keep. Returning an error aborts the reader's
/// current `on_received_data` call and propagates to the transport.
pub trait ElementListener {
    fn on_received_element(&mut self, element: &[u8]) -> NdnResult<()>;
}

impl<F> ElementListener for F
where
    F: FnMut(&[u8]) -> NdnResult<()>,
{
    fn on_received_element(&mut self, element: &[u8]) -> NdnResult<()> {
        self(element)
    }
}

/// Accumulates byte chunks and delivers complete TLV elements
///
/// One reader serves one logical connection: chunks must arrive in order
/// with no gaps. Independent connections use independent readers; a single
/// reader is not meant for concurrent use.
pub struct ElementReader<L: ElementListener> {
    listener: L,
    decoder: TlvStructureDecoder,
    /// Bytes of the current (incomplete) element received so far; empty
    /// whenever the decoder is at the start of a new element
    partial: BytesMut,
}

impl<L: ElementListener> ElementReader<L> {
    /// Create a new element reader delivering to `listener`
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            decoder: TlvStructureDecoder::new(),
            partial: BytesMut::new(),
        }
    }

    /// Get the listener back, consuming the reader
    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Process a newly received chunk
    ///
    /// Invokes the listener synchronously for every element the chunk
    /// completes; an incomplete tail is buffered until the next call.
    ///
    /// # Error Handling
    /// Returns error when the element framing is malformed or the listener
    /// fails. Parsing past corrupt framing is undefined, so the reader must
    /// not be fed again after an error; the connection owner is expected to
    /// terminate the connection and drop the reader.
    pub fn on_received_data(&mut self, data: &[u8]) -> NdnResult<()> {
        if self.partial.is_empty() {
            self.scan_chunk(data)
        } else {
            self.partial.extend_from_slice(data);
            self.scan_partial()
        }
    }

    /// Deliver complete elements directly from the chunk, copying only an
    /// incomplete tail into the accumulation buffer
    fn scan_chunk(&mut self, mut buf: &[u8]) -> NdnResult<()> {
        while !buf.is_empty() {
            let got_end = self.decoder.find_element_end(buf).inspect_err(|e| {
                warn!("malformed element framing: {}", e);
            })?;
            if !got_end {
                self.partial.extend_from_slice(buf);
                return Ok(());
            }
            let end = self.decoder.offset();
            trace!("delivering a {}-byte element", end);
            self.listener.on_received_element(&buf[..end])?;
            self.decoder.reset();
            buf = &buf[end..];
        }
        Ok(())
    }

    /// Deliver complete elements from the accumulation buffer
    ///
    /// The decoder's saved progress refers to offsets from the start of the
    /// current element, which is exactly what the accumulation buffer
    /// holds, so scanning resumes where the previous chunk stopped.
    fn scan_partial(&mut self) -> NdnResult<()> {
        loop {
            let got_end = self.decoder.find_element_end(&self.partial).inspect_err(|e| {
                warn!("malformed element framing: {}", e);
            })?;
            if !got_end {
                return Ok(());
            }
            let end = self.decoder.offset();
            trace!("delivering a {}-byte element", end);
            self.listener.on_received_element(&self.partial[..end])?;
            self.decoder.reset();
            self.partial.advance(end);
            if self.partial.is_empty() {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::TlvEncoder;
    use crate::error::NdnError;

    /// Test listener that copies every delivered element
    #[derive(Default)]
    struct Capture {
        elements: Vec<Vec<u8>>,
    }

    impl ElementListener for Capture {
        fn on_received_element(&mut self, element: &[u8]) -> NdnResult<()> {
            self.elements.push(element.to_vec());
            Ok(())
        }
    }

    fn encode_element(tlv_type: u64, value: &[u8]) -> Vec<u8> {
        let mut encoder = TlvEncoder::new();
        encoder.write_blob_tlv(tlv_type, value);
        encoder.output().to_vec()
    }

    #[test]
    fn test_one_chunk_one_element() {
        let wire = encode_element(6, &[1, 2, 3]);
        let mut reader = ElementReader::new(Capture::default());
        reader.on_received_data(&wire).unwrap();
        let capture = reader.into_listener();
        assert_eq!(capture.elements, vec![wire]);
    }

    #[test]
    fn test_one_byte_chunks_match_single_call() {
        let wire = encode_element(65000, &vec![0x3c; 400]);

        let mut reader = ElementReader::new(Capture::default());
        for byte in &wire {
            reader.on_received_data(std::slice::from_ref(byte)).unwrap();
        }
        let chunked = reader.into_listener();

        let mut reader = ElementReader::new(Capture::default());
        reader.on_received_data(&wire).unwrap();
        let whole = reader.into_listener();

        assert_eq!(chunked.elements, vec![wire]);
        assert_eq!(chunked.elements, whole.elements);
    }

    #[test]
    fn test_two_elements_in_one_chunk() {
        let first = encode_element(6, b"first");
        let second = encode_element(8, b"second element");
        let mut chunk = first.clone();
        chunk.extend_from_slice(&second);

        let mut reader = ElementReader::new(Capture::default());
        reader.on_received_data(&chunk).unwrap();
        let capture = reader.into_listener();
        assert_eq!(capture.elements, vec![first, second]);
    }

    #[test]
    fn test_element_split_across_chunks() {
        let wire = encode_element(6, &[0xee; 50]);
        let (head, tail) = wire.split_at(20);

        let mut reader = ElementReader::new(Capture::default());
        reader.on_received_data(head).unwrap();
        reader.on_received_data(tail).unwrap();
        let capture = reader.into_listener();
        assert_eq!(capture.elements, vec![wire]);
    }

    #[test]
    fn test_trailing_partial_element_then_completion() {
        let first = encode_element(6, &[1]);
        let second = encode_element(6, &[2, 2]);
        let mut chunk = first.clone();
        chunk.extend_from_slice(&second[..1]);

        let mut reader = ElementReader::new(Capture::default());
        reader.on_received_data(&chunk).unwrap();
        reader.on_received_data(&second[1..]).unwrap();
        let capture = reader.into_listener();
        assert_eq!(capture.elements, vec![first, second]);
    }

    #[test]
    fn test_closure_listener() {
        let wire = encode_element(6, &[7]);
        let mut count = 0usize;
        {
            let mut reader = ElementReader::new(|element: &[u8]| {
                assert_eq!(element, wire.as_slice());
                count += 1;
                Ok(())
            });
            reader.on_received_data(&wire).unwrap();
        }
        assert_eq!(count, 1);
    }

    #[test]
    fn test_listener_error_propagates() {
        let wire = encode_element(6, &[7]);
        let mut reader = ElementReader::new(|_: &[u8]| -> NdnResult<()> {
            Err(NdnError::InvalidData("rejected by owner".to_string()))
        });
        assert!(reader.on_received_data(&wire).is_err());
    }
}
