//! NDN-TLV encoding/decoding for the NDN wire format
//!
//! This crate provides the TLV (Type-Length-Value) codec used to frame
//! protocol messages:
//!
//! - [`var_number`]: the VAR-NUMBER variable-width unsigned integer
//!   primitive used for TLV type and length fields
//! - [`TlvDecoder`]: a cursor over an immutable buffer with typed read
//!   operations and nested-TLV bounds tracking
//! - [`TlvEncoder`]: a backward-growing output buffer, so nested
//!   length-prefixed structures can be written innermost-first
//! - [`TlvStructureDecoder`]: a resumable state machine that finds the end
//!   of one TLV element across partial network reads
//! - [`ElementReader`]: the streaming front end that turns raw byte chunks
//!   into one listener callback per complete element

pub mod error;
pub mod var_number;
pub mod decoder;
pub mod encoder;
pub mod structure_decoder;
pub mod element_reader;

pub use error::{NdnError, NdnResult};
pub use decoder::TlvDecoder;
pub use encoder::TlvEncoder;
pub use structure_decoder::TlvStructureDecoder;
pub use element_reader::{ElementListener, ElementReader};
