//! Immutable byte buffer abstraction
//!
//! Decoders hand out `&[u8]` slices that alias their input; when the bytes
//! must outlive the input buffer the caller copies them into a [`Blob`].
//! Encoders return their finished output as a [`Blob`].

use bytes::Bytes;
use std::fmt;

/// An immutable contiguous byte region with a fixed length.
///
/// Backed by [`bytes::Bytes`], so cloning is cheap (reference counted, no
/// copy) and the contents can never be mutated through a `Blob`.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Blob {
    bytes: Bytes,
}

impl Blob {
    /// Create an empty blob
    pub fn new() -> Self {
        Self {
            bytes: Bytes::new(),
        }
    }

    /// Copy the given bytes into a new blob
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(data),
        }
    }

    /// Get the blob contents as a byte slice
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the number of bytes in the blob
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check whether the blob is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the blob, returning the underlying buffer
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl From<Vec<u8>> for Blob {
    fn from(data: Vec<u8>) -> Self {
        Self {
            bytes: Bytes::from(data),
        }
    }
}

impl From<Bytes> for Blob {
    fn from(bytes: Bytes) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for Blob {
    fn from(data: &[u8]) -> Self {
        Self::from_slice(data)
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob[{} bytes:", self.bytes.len())?;
        for byte in self.bytes.iter().take(16) {
            write!(f, " {:02x}", byte)?;
        }
        if self.bytes.len() > 16 {
            write!(f, " ...")?;
        }
        write!(f, "]")
    }
}
