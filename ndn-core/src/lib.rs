//! Core types and utilities for the NDN wire-format codec layer
//!
//! This crate provides the shared error taxonomy and the immutable byte
//! buffer abstraction used by the TLV and DER codec crates.

pub mod error;
pub mod blob;

pub use error::{NdnError, NdnResult};
pub use blob::Blob;
