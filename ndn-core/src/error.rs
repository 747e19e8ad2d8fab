use thiserror::Error;

/// Main error type for ndn_rs codec operations
#[derive(Error, Debug)]
pub enum NdnError {
    #[error("TLV decoding error: {0}")]
    TlvDecoding(String),

    #[error("TLV encoding error: {0}")]
    TlvEncoding(String),

    #[error("DER decoding error: {0}")]
    DerDecoding(String),

    #[error("DER encoding error: {0}")]
    DerEncoding(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for ndn_rs codec operations
pub type NdnResult<T> = Result<T, NdnError>;
