//! Minimal ASN.1 DER support for RSA key structures.
//!
//! Decoding walks a bounds-checked cursor over the input; every read either
//! yields the requested bytes or fails with [`Error::Truncated`]. Encoding
//! builds a tree of [`DerNode`]s and serializes it bottom-up, so each length
//! is known before its header is written.

use zeroize::{Zeroize, Zeroizing};

use crate::errors::{Error, Result};

pub(crate) const INTEGER: u8 = 0x02;
pub(crate) const BIT_STRING: u8 = 0x03;
pub(crate) const OCTET_STRING: u8 = 0x04;
pub(crate) const SEQUENCE: u8 = 0x30;

/// `INTEGER 0`, the version field of PKCS#1 and PKCS#8 private keys.
pub(crate) const VERSION_ZERO: [u8; 3] = [INTEGER, 0x01, 0x00];

/// `AlgorithmIdentifier { rsaEncryption (1.2.840.113549.1.1.1), NULL }`.
pub(crate) const RSA_ALGORITHM_ID: [u8; 15] = [
    0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01, 0x05, 0x00,
];

/// Longest long-form length prefix accepted when decoding.
const MAX_LENGTH_OCTETS: usize = 4;

/// Cursor over an immutable byte slice.
#[derive(Debug)]
pub(crate) struct DerReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub(crate) fn read_byte(&mut self) -> Result<u8> {
        let byte = self.peek_byte().ok_or(Error::Truncated)?;
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::Truncated);
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Consume `expected` if the input continues with it; otherwise leave the
    /// cursor where it was.
    pub(crate) fn consume_if(&mut self, expected: &[u8]) -> bool {
        let matches = self.data[self.pos..].starts_with(expected);
        if matches {
            self.pos += expected.len();
        }
        matches
    }

    pub(crate) fn expect(&mut self, expected: &[u8], what: &'static str) -> Result<()> {
        let found = self.read_slice(expected.len())?;
        if found != expected {
            return Err(Error::Format(what));
        }
        Ok(())
    }

    /// Decode a short-form (`< 0x80`) or long-form (`0x81..=0x84`) length.
    pub(crate) fn read_length(&mut self) -> Result<usize> {
        let first = self.read_byte()?;
        if first < 0x80 {
            return Ok(usize::from(first));
        }

        let octets = usize::from(first & 0x7f);
        if octets == 0 || octets > MAX_LENGTH_OCTETS {
            return Err(Error::Format("unsupported length encoding"));
        }
        let len = self
            .read_slice(octets)?
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        Ok(len)
    }

    /// Read a tag byte, failing unless it equals `tag`, and return the
    /// declared content length.
    pub(crate) fn read_header(&mut self, tag: u8) -> Result<usize> {
        if self.read_byte()? != tag {
            return Err(Error::Format("unexpected tag"));
        }
        self.read_length()
    }

    /// Read an INTEGER and return its magnitude with sign padding stripped.
    pub(crate) fn read_integer(&mut self) -> Result<&'a [u8]> {
        let len = self.read_header(INTEGER)?;
        Ok(strip_leading_zeros(self.read_slice(len)?))
    }
}

/// Drop leading zero bytes from a big-endian unsigned integer.
pub(crate) fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Append the DER length octets for `len` to `out`.
pub(crate) fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let magnitude = strip_leading_zeros(&bytes);
    out.push(0x80 | magnitude.len() as u8);
    out.extend_from_slice(magnitude);
}

/// One node of a DER structure under construction.
#[derive(Debug)]
pub(crate) enum DerNode {
    /// Tag with literal content octets.
    Primitive { tag: u8, value: Vec<u8> },
    /// Tag whose content is the concatenated encoding of its children.
    Constructed { tag: u8, children: Vec<DerNode> },
    /// Already-encoded bytes copied verbatim.
    Raw(&'static [u8]),
}

impl DerNode {
    /// INTEGER from an unsigned big-endian magnitude. A zero byte is
    /// prepended when the high bit is set so the value stays positive.
    pub(crate) fn integer(magnitude: &[u8]) -> Self {
        let magnitude = strip_leading_zeros(magnitude);
        let mut value = Vec::with_capacity(magnitude.len() + 1);
        match magnitude.first() {
            None => value.push(0),
            Some(&b) if b & 0x80 != 0 => value.push(0),
            Some(_) => {}
        }
        value.extend_from_slice(magnitude);
        DerNode::Primitive {
            tag: INTEGER,
            value,
        }
    }

    pub(crate) fn sequence(children: Vec<DerNode>) -> Self {
        DerNode::Constructed {
            tag: SEQUENCE,
            children,
        }
    }

    /// OCTET STRING wrapping the encoding of `inner`.
    pub(crate) fn octet_string(inner: DerNode) -> Self {
        DerNode::Constructed {
            tag: OCTET_STRING,
            children: vec![inner],
        }
    }

    /// BIT STRING with zero unused bits wrapping the encoding of `inner`.
    pub(crate) fn bit_string(inner: DerNode) -> Self {
        DerNode::Constructed {
            tag: BIT_STRING,
            children: vec![DerNode::Raw(&[0x00]), inner],
        }
    }

    pub(crate) fn to_der(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::new());
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            DerNode::Primitive { tag, value } => {
                out.push(*tag);
                encode_length(value.len(), out);
                out.extend_from_slice(value);
            }
            DerNode::Constructed { tag, children } => {
                let mut body = Zeroizing::new(Vec::new());
                for child in children {
                    child.encode_into(&mut body);
                }
                out.push(*tag);
                encode_length(body.len(), out);
                out.extend_from_slice(&body);
            }
            DerNode::Raw(bytes) => out.extend_from_slice(bytes),
        }
    }
}

impl Drop for DerNode {
    fn drop(&mut self) {
        if let DerNode::Primitive { value, .. } = self {
            value.zeroize();
        }
    }
}
