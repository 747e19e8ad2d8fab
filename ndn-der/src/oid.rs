//! Object identifier codec
//!
//! # Encoding Format
//!
//! An OID payload packs the first two arcs into a single value `40*X + Y`,
//! then encodes that value and every remaining arc in base-128: the arc is
//! split into 7-bit groups, all but the last carrying a continuation bit.
//!
//! ```text
//! 1.2.840.113549  ->  2a 86 48 86 f7 0d
//! ```
//!
//! The string form is dot-separated decimal with the first arc in {0,1,2}.

use crate::error::{NdnError, NdnResult};
use std::fmt;
use std::str::FromStr;

/// An object identifier: an ordered sequence of non-negative integer arcs
///
/// Semantically immutable once constructed; two OIDs are equal iff their
/// arc sequences are equal elementwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: Vec<u32>,
}

impl Oid {
    /// Create an OID from its arc values
    pub fn new(arcs: &[u32]) -> Self {
        Self {
            arcs: arcs.to_vec(),
        }
    }

    /// Get the arc values
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Encode the OID payload (without a DER tag or length)
    ///
    /// # Error Handling
    /// Returns error if there are fewer than two arcs, the first arc is not
    /// in {0, 1, 2}, or the second arc is out of range for the first
    /// (at most 39 under arcs 0 and 1).
    pub fn encode(&self) -> NdnResult<Vec<u8>> {
        if self.arcs.len() < 2 {
            return Err(NdnError::DerEncoding(
                "An OID must have at least 2 arcs".to_string(),
            ));
        }
        if self.arcs[0] > 2 {
            return Err(NdnError::DerEncoding(format!(
                "The first OID arc must be 0, 1, or 2, got {}",
                self.arcs[0]
            )));
        }
        if self.arcs[0] < 2 && self.arcs[1] > 39 {
            return Err(NdnError::DerEncoding(format!(
                "The second OID arc must be at most 39 under arc {}, got {}",
                self.arcs[0], self.arcs[1]
            )));
        }

        let first = 40u32
            .checked_mul(self.arcs[0])
            .and_then(|value| value.checked_add(self.arcs[1]))
            .ok_or_else(|| NdnError::DerEncoding("OID arc value overflow".to_string()))?;

        let mut out = Vec::new();
        encode_arc(first, &mut out);
        for &arc in &self.arcs[2..] {
            encode_arc(arc, &mut out);
        }
        Ok(out)
    }

    /// Decode an OID payload (without a DER tag or length)
    ///
    /// # Error Handling
    /// Returns error on an empty payload, a dangling continuation bit at the
    /// end of the payload, or an arc value that overflows.
    pub fn decode(payload: &[u8]) -> NdnResult<Self> {
        if payload.is_empty() {
            return Err(NdnError::DerDecoding("Empty OID payload".to_string()));
        }

        let mut pos = 0;
        let first = decode_arc(payload, &mut pos)?;
        // The first base-128 value combines the first two arcs
        let mut arcs = if first < 40 {
            vec![0, first]
        } else if first < 80 {
            vec![1, first - 40]
        } else {
            vec![2, first - 80]
        };

        while pos < payload.len() {
            arcs.push(decode_arc(payload, &mut pos)?);
        }
        Ok(Self { arcs })
    }
}

/// Append the base-128 encoding of one arc value
fn encode_arc(value: u32, out: &mut Vec<u8>) {
    let mut groups = [0u8; 5];
    let mut count = 0;
    let mut remaining = value;
    loop {
        groups[count] = (remaining & 0x7f) as u8;
        count += 1;
        remaining >>= 7;
        if remaining == 0 {
            break;
        }
    }
    // Most significant group first; continuation bit on all but the last
    for i in (1..count).rev() {
        out.push(groups[i] | 0x80);
    }
    out.push(groups[0]);
}

/// Decode one base-128 arc value starting at `*pos`, advancing `*pos`
fn decode_arc(payload: &[u8], pos: &mut usize) -> NdnResult<u32> {
    let mut value = 0u32;
    loop {
        let byte = *payload.get(*pos).ok_or_else(|| {
            NdnError::DerDecoding(
                "OID payload ends with a dangling continuation bit".to_string(),
            )
        })?;
        *pos += 1;
        value = value
            .checked_mul(128)
            .and_then(|v| v.checked_add((byte & 0x7f) as u32))
            .ok_or_else(|| NdnError::DerDecoding("OID arc value overflow".to_string()))?;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

impl FromStr for Oid {
    type Err = NdnError;

    /// Parse the dot-separated decimal string form
    fn from_str(s: &str) -> NdnResult<Self> {
        let arcs = s
            .split('.')
            .map(|part| {
                part.parse::<u32>().map_err(|_| {
                    NdnError::InvalidData(format!("Invalid OID arc \"{}\"", part))
                })
            })
            .collect::<NdnResult<Vec<u32>>>()?;
        if arcs.len() < 2 {
            return Err(NdnError::InvalidData(
                "An OID must have at least 2 arcs".to_string(),
            ));
        }
        if arcs[0] > 2 {
            return Err(NdnError::InvalidData(format!(
                "The first OID arc must be 0, 1, or 2, got {}",
                arcs[0]
            )));
        }
        Ok(Self { arcs })
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.arcs.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}
