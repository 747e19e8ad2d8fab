//! Error types re-exported from ndn-core

pub use ndn_core::error::{NdnError, NdnResult};
