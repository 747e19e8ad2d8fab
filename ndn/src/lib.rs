//! ndn_rs - the wire-format codec layer of an NDN protocol stack
//!
//! This library converts in-memory object trees to and from the two binary
//! encodings that frame protocol messages and cryptographic material: the
//! NDN-TLV encoding with variable-width length fields, and the ASN.1 DER
//! encoding used for certificates and keys.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `ndn-core`: Error handling and the `Blob` byte-buffer abstraction
//! - `ndn-tlv`: VAR-NUMBER primitive, TLV encoder/decoder, and the
//!   streaming element framer (`TlvStructureDecoder`, `ElementReader`)
//! - `ndn-der`: Recursive DER node tree, OID codec, generalized time
//!
//! Higher layers (transports delivering byte chunks, the packet object
//! model, certificate storage) sit on top of this crate and are out of
//! scope here.
//!
//! # Example
//!
//! ```rust
//! use ndn::{TlvDecoder, TlvEncoder};
//!
//! // Encode a structured element innermost-first
//! let mut encoder = TlvEncoder::new();
//! let save_length = encoder.len();
//! encoder.write_non_negative_integer_tlv(26, 4000);
//! encoder.write_blob_tlv(8, b"prefix");
//! encoder.write_type_and_length(6, encoder.len() - save_length);
//! let wire = encoder.into_blob();
//!
//! // Decode it back
//! let mut decoder = TlvDecoder::new(wire.as_slice());
//! let end_offset = decoder.read_nested_tlvs_start(6).unwrap();
//! assert_eq!(decoder.read_blob_tlv(8).unwrap(), b"prefix");
//! assert_eq!(
//!     decoder
//!         .read_optional_non_negative_integer_tlv(26, end_offset)
//!         .unwrap(),
//!     Some(4000)
//! );
//! decoder.finish_nested_tlvs(end_offset, false).unwrap();
//! ```

pub use ndn_core::{Blob, NdnError, NdnResult};
pub use ndn_tlv::{
    var_number, ElementListener, ElementReader, TlvDecoder, TlvEncoder, TlvStructureDecoder,
};
pub use ndn_der::{time, DerNode, DerNodeType, Oid};
