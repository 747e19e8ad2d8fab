//! Recursive DER node tree
//!
//! A [`DerNode`] is one TLV of a DER encoding: a tag, and either a
//! primitive payload or an ordered list of child nodes. Trees are built
//! either top-down programmatically (then encoded) or bottom-up by
//! [`DerNode::decode`] (then inspected through the typed accessors).
//!
//! # Size Caching
//!
//! A node's total size is cached and recomputed only when the node is
//! dirty. Every mutation path flows through the owning node
//! ([`add_child`](DerNode::add_child), [`child_mut`](DerNode::child_mut)),
//! and each of those marks the node it passes through dirty, so an outer
//! header whose length encoding depends on descendant sizes is recomputed
//! once at the next `size()` or `encode()` rather than on every mutation.

use crate::error::{NdnError, NdnResult};
use crate::oid::Oid;
use crate::time;
use crate::types::{self, DerNodeType};
use log::trace;
use ndn_core::Blob;

/// The value of one DER node: primitive payload bytes, or child nodes for
/// a constructed type
#[derive(Debug, Clone)]
enum DerPayload {
    Primitive(Vec<u8>),
    Constructed(Vec<DerNode>),
}

/// One node of a DER tree
///
/// Each child is exclusively owned by its parent; DER structures are true
/// trees with no sharing and no cycles.
#[derive(Debug, Clone)]
pub struct DerNode {
    node_type: DerNodeType,
    payload: DerPayload,
    cached_size: usize,
    dirty: bool,
}

impl DerNode {
    fn primitive(node_type: DerNodeType, payload: Vec<u8>) -> Self {
        Self {
            node_type,
            payload: DerPayload::Primitive(payload),
            cached_size: 0,
            dirty: true,
        }
    }

    /// Create an empty SEQUENCE node
    pub fn sequence() -> Self {
        Self {
            node_type: DerNodeType::Sequence,
            payload: DerPayload::Constructed(Vec::new()),
            cached_size: 0,
            dirty: true,
        }
    }

    /// Create a BOOLEAN node
    pub fn boolean(value: bool) -> Self {
        Self::primitive(
            DerNodeType::Boolean,
            vec![if value { 0xff } else { 0x00 }],
        )
    }

    /// Create an INTEGER node from a non-negative value
    ///
    /// The payload uses the positive-integer DER convention: a zero byte is
    /// prepended whenever the high bit of the most significant payload byte
    /// would otherwise be set, so the encoding cannot be mistaken for a
    /// negative two's-complement value.
    ///
    /// # Error Handling
    /// Returns error for a negative value.
    pub fn integer(value: i64) -> NdnResult<Self> {
        if value < 0 {
            return Err(NdnError::DerEncoding(format!(
                "Negative integers are not supported, got {}",
                value
            )));
        }

        let mut payload = Vec::new();
        let mut remaining = value as u64;
        if remaining == 0 {
            payload.push(0);
        } else {
            while remaining > 0 {
                payload.push((remaining & 0xff) as u8);
                remaining >>= 8;
            }
            if payload[payload.len() - 1] & 0x80 != 0 {
                payload.push(0x00);
            }
            payload.reverse();
        }
        Ok(Self::primitive(DerNodeType::Integer, payload))
    }

    /// Create a BIT STRING node
    ///
    /// # Arguments
    /// * `bits` - The bit string bytes
    /// * `padding` - Count of unused bits in the last byte (0-7), stored as
    ///   the first payload byte
    pub fn bit_string(bits: &[u8], padding: u8) -> NdnResult<Self> {
        if padding > 7 {
            return Err(NdnError::DerEncoding(format!(
                "Bit string padding must be 0-7, got {}",
                padding
            )));
        }
        let mut payload = Vec::with_capacity(1 + bits.len());
        payload.push(padding);
        payload.extend_from_slice(bits);
        Ok(Self::primitive(DerNodeType::BitString, payload))
    }

    /// Create an OCTET STRING node
    pub fn octet_string(value: &[u8]) -> Self {
        Self::primitive(DerNodeType::OctetString, value.to_vec())
    }

    /// Create a NULL node
    pub fn null() -> Self {
        Self::primitive(DerNodeType::Null, Vec::new())
    }

    /// Create an OBJECT IDENTIFIER node
    pub fn oid(oid: &Oid) -> NdnResult<Self> {
        Ok(Self::primitive(DerNodeType::ObjectIdentifier, oid.encode()?))
    }

    /// Create a PrintableString node
    ///
    /// # Error Handling
    /// Returns error if the string is not ASCII.
    pub fn printable_string(value: &str) -> NdnResult<Self> {
        if !value.is_ascii() {
            return Err(NdnError::DerEncoding(
                "PrintableString must be ASCII".to_string(),
            ));
        }
        Ok(Self::primitive(
            DerNodeType::PrintableString,
            value.as_bytes().to_vec(),
        ))
    }

    /// Create a GeneralizedTime node from milliseconds since the Unix epoch
    pub fn generalized_time(msec: u64) -> Self {
        Self::primitive(
            DerNodeType::GeneralizedTime,
            time::format_generalized_time(msec).into_bytes(),
        )
    }

    /// Create a node with an arbitrary primitive tag and raw payload bytes
    pub fn generic(tag: u8, payload: &[u8]) -> Self {
        Self::primitive(DerNodeType::from_tag(tag), payload.to_vec())
    }

    /// Get the node type
    pub fn node_type(&self) -> DerNodeType {
        self.node_type
    }

    /// Get the total encoded size in bytes (header plus payload)
    ///
    /// Lazily recomputed: the cached value is reused until the node is
    /// marked dirty by a mutation.
    pub fn size(&mut self) -> usize {
        if self.dirty {
            let payload_length = self.payload_length();
            self.cached_size =
                1 + types::encoded_length_size(payload_length) + payload_length;
            self.dirty = false;
        }
        self.cached_size
    }

    /// Total payload length, recursing into children for structures
    fn payload_length(&mut self) -> usize {
        match &mut self.payload {
            DerPayload::Primitive(payload) => payload.len(),
            DerPayload::Constructed(children) => {
                children.iter_mut().map(|child| child.size()).sum()
            }
        }
    }

    /// Append a child to a structure node, marking this node dirty
    ///
    /// # Error Handling
    /// Returns error if this node is not a constructed type.
    pub fn add_child(&mut self, child: DerNode) -> NdnResult<()> {
        match &mut self.payload {
            DerPayload::Constructed(children) => {
                children.push(child);
                self.dirty = true;
                Ok(())
            }
            DerPayload::Primitive(_) => Err(NdnError::DerEncoding(format!(
                "Cannot add a child to the primitive node type {:?}",
                self.node_type
            ))),
        }
    }

    /// Get the children of a structure node
    pub fn children(&self) -> NdnResult<&[DerNode]> {
        match &self.payload {
            DerPayload::Constructed(children) => Ok(children),
            DerPayload::Primitive(_) => Err(NdnError::DerDecoding(format!(
                "The node type {:?} has no children",
                self.node_type
            ))),
        }
    }

    /// Get one child of a structure node
    pub fn child(&self, index: usize) -> NdnResult<&DerNode> {
        self.children()?.get(index).ok_or_else(|| {
            NdnError::DerDecoding(format!("No child at index {}", index))
        })
    }

    /// Get mutable access to one child, marking this node dirty
    ///
    /// The conservative dirtying means a `child_mut` chain from the root
    /// invalidates the cached size of every ancestor on the access path,
    /// whether or not the child is then mutated.
    pub fn child_mut(&mut self, index: usize) -> NdnResult<&mut DerNode> {
        self.dirty = true;
        match &mut self.payload {
            DerPayload::Constructed(children) => children.get_mut(index).ok_or_else(|| {
                NdnError::DerDecoding(format!("No child at index {}", index))
            }),
            DerPayload::Primitive(_) => Err(NdnError::DerEncoding(format!(
                "The node type {:?} has no children",
                self.node_type
            ))),
        }
    }

    /// Encode the node and its descendants to DER bytes
    ///
    /// # Error Handling
    /// Returns error before any bytes are produced when the node is
    /// inconsistent: a constructed tag on a primitive payload or the
    /// reverse.
    pub fn encode(&mut self) -> NdnResult<Blob> {
        self.check_consistency()?;
        let size = self.size();
        let mut out = Vec::with_capacity(size);
        self.encode_into(&mut out);
        Ok(Blob::from(out))
    }

    fn check_consistency(&self) -> NdnResult<()> {
        let constructed_payload = matches!(self.payload, DerPayload::Constructed(_));
        if self.node_type.is_constructed() != constructed_payload {
            return Err(NdnError::DerEncoding(format!(
                "The tag {:#04x} does not match the node's payload kind",
                self.node_type.tag()
            )));
        }
        if let DerPayload::Constructed(children) = &self.payload {
            for child in children {
                child.check_consistency()?;
            }
        }
        Ok(())
    }

    fn encode_into(&mut self, out: &mut Vec<u8>) {
        out.push(self.node_type.tag());
        // Children first would invert the wire order; the header needs the
        // total payload length, which size() supplies without encoding
        let payload_length = self.payload_length();
        types::encode_length(payload_length, out);
        match &mut self.payload {
            DerPayload::Primitive(payload) => out.extend_from_slice(payload),
            DerPayload::Constructed(children) => {
                for child in children {
                    child.encode_into(out);
                }
            }
        }
    }

    /// Decode a DER node tree from the start of `input`
    ///
    /// The entire element must be present; trailing bytes after the
    /// top-level element are an error.
    pub fn decode(input: &[u8]) -> NdnResult<Self> {
        trace!("decoding a DER tree from {} bytes", input.len());
        let (node, consumed) = Self::decode_at(input, 0)?;
        if consumed != input.len() {
            return Err(NdnError::DerDecoding(format!(
                "{} trailing bytes after the DER element",
                input.len() - consumed
            )));
        }
        Ok(node)
    }

    /// Decode one DER node starting at `offset` in `input`
    ///
    /// # Returns
    /// Returns `Ok((node, bytes_consumed))` if successful.
    pub fn decode_at(input: &[u8], offset: usize) -> NdnResult<(Self, usize)> {
        let tag = *input.get(offset).ok_or_else(|| {
            NdnError::DerDecoding("Buffer exhausted while reading DER tag".to_string())
        })?;
        let node_type = DerNodeType::from_tag(tag);

        let (payload_length, length_size) = types::decode_length(input, offset + 1)?;
        let header_size = 1 + length_size;
        let value_start = offset + header_size;
        let end = value_start.checked_add(payload_length).filter(|&end| {
            end <= input.len()
        });
        let Some(end) = end else {
            return Err(NdnError::DerDecoding(format!(
                "DER length {} exceeds the bytes left in the buffer",
                payload_length
            )));
        };

        let node = if tag & 0x20 != 0 {
            if node_type != DerNodeType::Sequence {
                return Err(NdnError::DerDecoding(format!(
                    "Unsupported constructed DER tag {:#04x}",
                    tag
                )));
            }
            // Children must exactly fill the declared length; bounding the
            // recursion at `end` turns a child overrun into an exhaustion
            // error inside the child parse
            let mut children = Vec::new();
            let mut position = value_start;
            while position < end {
                let (child, consumed) = Self::decode_at(&input[..end], position)?;
                children.push(child);
                position += consumed;
            }
            Self {
                node_type,
                payload: DerPayload::Constructed(children),
                cached_size: header_size + payload_length,
                dirty: false,
            }
        } else {
            let payload = input[value_start..end].to_vec();
            if node_type == DerNodeType::BitString {
                if payload.is_empty() {
                    return Err(NdnError::DerDecoding(
                        "Empty BIT STRING payload".to_string(),
                    ));
                }
                if payload[0] > 7 {
                    return Err(NdnError::DerDecoding(format!(
                        "Invalid BIT STRING padding {} (must be 0-7)",
                        payload[0]
                    )));
                }
            }
            Self {
                node_type,
                payload: DerPayload::Primitive(payload),
                cached_size: header_size + payload_length,
                dirty: false,
            }
        };

        Ok((node, header_size + payload_length))
    }

    /// Get the primitive payload bytes
    pub fn payload(&self) -> NdnResult<&[u8]> {
        match &self.payload {
            DerPayload::Primitive(payload) => Ok(payload),
            DerPayload::Constructed(_) => Err(NdnError::DerDecoding(format!(
                "The constructed node type {:?} has no primitive payload",
                self.node_type
            ))),
        }
    }

    fn expect_type(&self, expected: DerNodeType) -> NdnResult<&[u8]> {
        if self.node_type != expected {
            return Err(NdnError::DerDecoding(format!(
                "Expected a {:?} node, got {:?}",
                expected, self.node_type
            )));
        }
        self.payload()
    }

    /// Interpret an INTEGER node as a non-negative value
    ///
    /// # Error Handling
    /// Returns error for a non-Integer node, an empty payload, a value with
    /// the sign bit set (negative), or one too large for `i64`.
    pub fn as_integer(&self) -> NdnResult<i64> {
        let payload = self.expect_type(DerNodeType::Integer)?;
        if payload.is_empty() {
            return Err(NdnError::DerDecoding("Empty INTEGER payload".to_string()));
        }
        if payload[0] & 0x80 != 0 {
            return Err(NdnError::DerDecoding(
                "Negative integers are not supported".to_string(),
            ));
        }

        // Skip the disambiguating zero byte, if any
        let bytes = if payload[0] == 0 { &payload[1..] } else { payload };
        if bytes.len() > 8 {
            return Err(NdnError::DerDecoding(format!(
                "INTEGER of {} bytes is too large for i64",
                payload.len()
            )));
        }
        let mut value = 0u64;
        for &byte in bytes {
            value = (value << 8) | byte as u64;
        }
        i64::try_from(value).map_err(|_| {
            NdnError::DerDecoding("INTEGER value is too large for i64".to_string())
        })
    }

    /// Interpret a BOOLEAN node
    pub fn as_boolean(&self) -> NdnResult<bool> {
        let payload = self.expect_type(DerNodeType::Boolean)?;
        if payload.len() != 1 {
            return Err(NdnError::DerDecoding(format!(
                "BOOLEAN payload must be 1 byte, got {}",
                payload.len()
            )));
        }
        Ok(payload[0] != 0)
    }

    /// Interpret a BIT STRING node
    ///
    /// # Returns
    /// Returns `(bits, padding)`: the bit string bytes and the count of
    /// unused bits in the last byte.
    pub fn as_bit_string(&self) -> NdnResult<(&[u8], u8)> {
        let payload = self.expect_type(DerNodeType::BitString)?;
        // Decode validated the payload shape, but the node may have been
        // built programmatically through generic()
        if payload.is_empty() || payload[0] > 7 {
            return Err(NdnError::DerDecoding("Invalid BIT STRING payload".to_string()));
        }
        Ok((&payload[1..], payload[0]))
    }

    /// Interpret an OBJECT IDENTIFIER node
    pub fn as_oid(&self) -> NdnResult<Oid> {
        Oid::decode(self.expect_type(DerNodeType::ObjectIdentifier)?)
    }

    /// Interpret a GeneralizedTime node as milliseconds since the Unix
    /// epoch
    pub fn as_timestamp(&self) -> NdnResult<u64> {
        let payload = self.expect_type(DerNodeType::GeneralizedTime)?;
        let value = std::str::from_utf8(payload).map_err(|_| {
            NdnError::DerDecoding("GeneralizedTime payload is not ASCII".to_string())
        })?;
        time::parse_generalized_time(value)
    }

    /// Interpret a PrintableString node
    pub fn as_string(&self) -> NdnResult<&str> {
        let payload = self.expect_type(DerNodeType::PrintableString)?;
        std::str::from_utf8(payload).map_err(|_| {
            NdnError::DerDecoding("PrintableString payload is not ASCII".to_string())
        })
    }
}

/// Equality over tag, payload, and children; the size cache does not
/// participate
impl PartialEq for DerNode {
    fn eq(&self, other: &Self) -> bool {
        if self.node_type != other.node_type {
            return false;
        }
        match (&self.payload, &other.payload) {
            (DerPayload::Primitive(a), DerPayload::Primitive(b)) => a == b,
            (DerPayload::Constructed(a), DerPayload::Constructed(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for DerNode {}

#[cfg(test)]
mod tests {
    use super::*;

    /// A public-key-info style tree: SEQUENCE { SEQUENCE { OID, NULL },
    /// BIT STRING }
    fn sample_tree() -> DerNode {
        let mut algorithm = DerNode::sequence();
        algorithm
            .add_child(DerNode::oid(&Oid::new(&[1, 2, 840, 113549, 1, 1, 1])).unwrap())
            .unwrap();
        algorithm.add_child(DerNode::null()).unwrap();

        let mut root = DerNode::sequence();
        root.add_child(algorithm).unwrap();
        root.add_child(DerNode::bit_string(&[0x6e, 0x5d, 0xc0], 6).unwrap())
            .unwrap();
        root
    }

    #[test]
    fn test_tree_round_trip() {
        let mut tree = sample_tree();
        let encoded = tree.encode().unwrap();
        let decoded = DerNode::decode(encoded.as_slice()).unwrap();
        assert_eq!(decoded, tree);

        let algorithm = decoded.child(0).unwrap();
        assert_eq!(
            algorithm.child(0).unwrap().as_oid().unwrap(),
            Oid::new(&[1, 2, 840, 113549, 1, 1, 1])
        );
        assert_eq!(algorithm.child(1).unwrap().node_type(), DerNodeType::Null);
        let (bits, padding) = decoded.child(1).unwrap().as_bit_string().unwrap();
        assert_eq!(bits, &[0x6e, 0x5d, 0xc0]);
        assert_eq!(padding, 6);
    }

    #[test]
    fn test_integer_wire_format() {
        // 127 fits without a leading zero
        let mut node = DerNode::integer(127).unwrap();
        assert_eq!(node.encode().unwrap().as_slice(), &[0x02, 0x01, 0x7f]);

        // 128 sets the high bit, so a zero byte is prepended
        let mut node = DerNode::integer(128).unwrap();
        assert_eq!(node.encode().unwrap().as_slice(), &[0x02, 0x02, 0x00, 0x80]);

        // 65537, the common RSA exponent
        let mut node = DerNode::integer(65537).unwrap();
        assert_eq!(
            node.encode().unwrap().as_slice(),
            &[0x02, 0x03, 0x01, 0x00, 0x01]
        );

        let mut node = DerNode::integer(0).unwrap();
        assert_eq!(node.encode().unwrap().as_slice(), &[0x02, 0x01, 0x00]);
    }

    #[test]
    fn test_integer_round_trip() {
        for value in [0i64, 1, 127, 128, 255, 256, 65537, i64::MAX] {
            let mut node = DerNode::integer(value).unwrap();
            let encoded = node.encode().unwrap();
            let decoded = DerNode::decode(encoded.as_slice()).unwrap();
            assert_eq!(decoded.as_integer().unwrap(), value, "value {}", value);
        }
        assert!(DerNode::integer(-1).is_err());
    }

    #[test]
    fn test_as_integer_rejects_negative_payload() {
        let node = DerNode::decode(&[0x02, 0x01, 0x80]).unwrap();
        assert!(node.as_integer().is_err());
    }

    #[test]
    fn test_size_is_cached_and_invalidated() {
        let mut root = DerNode::sequence();
        root.add_child(DerNode::null()).unwrap();
        let before = root.size();
        assert_eq!(before, root.size());

        root.add_child(DerNode::octet_string(&[1, 2, 3])).unwrap();
        let after = root.size();
        assert_eq!(after, before + 5);
        assert_eq!(after, root.encode().unwrap().len());
    }

    #[test]
    fn test_child_mut_dirties_ancestors() {
        let mut root = DerNode::sequence();
        let mut inner = DerNode::sequence();
        inner.add_child(DerNode::octet_string(&[])).unwrap();
        root.add_child(inner).unwrap();
        let before = root.size();

        // Grow the grandchild through the access path from the root
        root.child_mut(0)
            .unwrap()
            .add_child(DerNode::octet_string(&[0xab; 200]))
            .unwrap();
        let after = root.size();
        assert!(after > before);
        assert_eq!(after, root.encode().unwrap().len());
    }

    #[test]
    fn test_long_form_header() {
        let mut node = DerNode::octet_string(&[0x55; 200]);
        let encoded = node.encode().unwrap();
        assert_eq!(&encoded.as_slice()[..3], &[0x04, 0x81, 200]);
        assert_eq!(encoded.len(), 203);
        let decoded = DerNode::decode(encoded.as_slice()).unwrap();
        assert_eq!(decoded.payload().unwrap().len(), 200);
    }

    #[test]
    fn test_generalized_time_round_trip() {
        let mut node = DerNode::generalized_time(1388534399000);
        let encoded = node.encode().unwrap();
        let decoded = DerNode::decode(encoded.as_slice()).unwrap();
        assert_eq!(decoded.as_timestamp().unwrap(), 1388534399000);
        assert_eq!(decoded.payload().unwrap(), b"20131231235959Z");
    }

    #[test]
    fn test_printable_string() {
        let mut node = DerNode::printable_string("KEY").unwrap();
        let encoded = node.encode().unwrap();
        assert_eq!(encoded.as_slice(), &[0x13, 0x03, b'K', b'E', b'Y']);
        let decoded = DerNode::decode(encoded.as_slice()).unwrap();
        assert_eq!(decoded.as_string().unwrap(), "KEY");
        assert!(DerNode::printable_string("ké").is_err());
    }

    #[test]
    fn test_boolean_round_trip() {
        for value in [true, false] {
            let mut node = DerNode::boolean(value);
            let encoded = node.encode().unwrap();
            let decoded = DerNode::decode(encoded.as_slice()).unwrap();
            assert_eq!(decoded.as_boolean().unwrap(), value);
        }
    }

    #[test]
    fn test_generic_node_survives_round_trip() {
        // UTF8String (0x0c) is not a dedicated type; it decodes as Generic
        let mut node = DerNode::generic(0x0c, b"hello");
        let encoded = node.encode().unwrap();
        let decoded = DerNode::decode(encoded.as_slice()).unwrap();
        assert_eq!(decoded.node_type(), DerNodeType::Generic(0x0c));
        assert_eq!(decoded.payload().unwrap(), b"hello");
        assert_eq!(decoded, node);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        // Truncated payload
        assert!(DerNode::decode(&[0x04, 0x05, 1, 2]).is_err());
        // Trailing bytes after the element
        assert!(DerNode::decode(&[0x05, 0x00, 0x00]).is_err());
        // Unsupported constructed tag (SET)
        assert!(DerNode::decode(&[0x31, 0x02, 0x05, 0x00]).is_err());
        // Child extends past the parent's declared length
        assert!(DerNode::decode(&[0x30, 0x03, 0x04, 0x03, 1, 2, 3]).is_err());
        // Invalid BIT STRING padding
        assert!(DerNode::decode(&[0x03, 0x02, 0x08, 0xff]).is_err());
        // Empty BIT STRING payload
        assert!(DerNode::decode(&[0x03, 0x00]).is_err());
    }

    #[test]
    fn test_type_mismatch_accessors() {
        let node = DerNode::octet_string(&[1]);
        assert!(node.as_integer().is_err());
        assert!(node.as_oid().is_err());
        assert!(node.children().is_err());

        let sequence = DerNode::sequence();
        assert!(sequence.payload().is_err());
    }

    #[test]
    fn test_add_child_to_primitive_fails() {
        let mut node = DerNode::null();
        assert!(node.add_child(DerNode::null()).is_err());
    }
}
