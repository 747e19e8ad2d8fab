//! ASN.1 DER encoding/decoding for certificate and key material
//!
//! This crate provides a recursive DER node tree with encode, decode, and
//! lazy size computation, plus the OID and generalized-time sub-codecs:
//!
//! - [`DerNode`]: the tree of typed nodes (sequence, integer, bit string,
//!   octet string, null, OID, printable string, generalized time, generic
//!   byte string)
//! - [`Oid`]: object identifiers with the base-128 arc codec
//! - [`time`]: the `YYYYMMDDHHMMSSZ` generalized-time string codec
//!
//! Only the strict DER subset is accepted: definite lengths with minimal
//! width encoding. BER-only constructs (indefinite length, non-minimal
//! length forms) are decoding errors.

pub mod error;
pub mod types;
pub mod node;
pub mod oid;
pub mod time;

pub use error::{NdnError, NdnResult};
pub use types::DerNodeType;
pub use node::DerNode;
pub use oid::Oid;
