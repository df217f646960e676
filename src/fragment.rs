//! Fragment wire format and the fragmentation engine.
//!
//! A response payload is carried as a sequence of fragment datagrams. Each
//! datagram is a UTF-8 text header terminated by the delimiter `xxx`,
//! followed by the raw payload bytes:
//!
//! ```text
//! <index>,<total>,<payload_len>xxx<payload bytes>
//! ```
//!
//! The delimiter cannot occur inside the numeric header fields, so the
//! receiver splits header from payload at the *first* occurrence of the
//! delimiter. The payload is raw bytes and may itself contain `xxx`; it is
//! never scanned.

use bytes::Bytes;

use crate::error::{FetchgramError, Result};

/// Terminates the text header of a fragment datagram.
pub const HEADER_DELIMITER: &[u8; 3] = b"xxx";

/// Upper bound on the encoded header length: two `u32` fields and one
/// `usize` field in decimal, two commas, and the delimiter.
pub const MAX_HEADER_LEN: usize = 10 + 1 + 10 + 1 + 20 + HEADER_DELIMITER.len();

/// One datagram-sized slice of a response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Position of this fragment in the response, starting at zero.
    pub index: u32,
    /// Total number of fragments in the response. Always at least one.
    pub total: u32,
    /// Payload bytes carried by this fragment.
    pub payload: Bytes,
}

impl Fragment {
    /// Check if this is the last fragment of its response.
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }

    /// Parse a fragment from a datagram.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let delim = data
            .windows(HEADER_DELIMITER.len())
            .position(|w| w == HEADER_DELIMITER)
            .ok_or_else(|| FetchgramError::malformed_fragment("missing header delimiter"))?;

        let header = std::str::from_utf8(&data[..delim])
            .map_err(|_| FetchgramError::malformed_fragment("header is not valid UTF-8"))?;

        let mut fields = header.splitn(3, ',');
        let index = parse_field(fields.next(), "index")?;
        let total = parse_field(fields.next(), "total")?;
        let declared = parse_field::<usize>(fields.next(), "payload length")?;

        if total == 0 {
            return Err(FetchgramError::malformed_fragment("total must be at least 1"));
        }
        if index >= total {
            return Err(FetchgramError::malformed_fragment(format!(
                "index {index} out of range for total {total}"
            )));
        }

        let payload = &data[delim + HEADER_DELIMITER.len()..];
        if payload.len() != declared {
            return Err(FetchgramError::LengthMismatch {
                declared,
                actual: payload.len(),
            });
        }

        Ok(Self {
            index,
            total,
            payload: Bytes::copy_from_slice(payload),
        })
    }

    /// Serialize the fragment to a datagram.
    pub fn to_bytes(&self) -> Vec<u8> {
        let header = format!("{},{},{}", self.index, self.total, self.payload.len());
        let mut buf = Vec::with_capacity(header.len() + HEADER_DELIMITER.len() + self.payload.len());
        buf.extend_from_slice(header.as_bytes());
        buf.extend_from_slice(HEADER_DELIMITER);
        buf.extend_from_slice(&self.payload);
        buf
    }
}

fn parse_field<T: std::str::FromStr>(field: Option<&str>, name: &str) -> Result<T> {
    field
        .ok_or_else(|| FetchgramError::malformed_fragment(format!("missing {name} field")))?
        .parse()
        .map_err(|_| FetchgramError::malformed_fragment(format!("invalid {name} field")))
}

/// Number of fragments needed for `len` content bytes.
///
/// Empty content still takes one (empty) fragment, so the receiver always
/// gets a completion signal.
pub fn fragment_count(len: usize, max_payload: usize) -> u32 {
    if len == 0 {
        1
    } else {
        len.div_ceil(max_payload) as u32
    }
}

/// Lazily splits a response payload into fragments in index order.
///
/// A pure function of its content and maximum payload size: iterating twice
/// over two fragmenters built from the same input yields identical
/// fragments. Payload slices share the underlying content buffer, so no
/// bytes are copied.
#[derive(Debug, Clone)]
pub struct Fragmenter {
    content: Bytes,
    max_payload: usize,
    total: u32,
    next_index: u32,
}

impl Fragmenter {
    /// Create a fragmenter over `content`.
    ///
    /// Fails with [`FetchgramError::InvalidMaxPayload`] when `max_payload`
    /// is zero.
    pub fn new(content: Bytes, max_payload: usize) -> Result<Self> {
        if max_payload == 0 {
            return Err(FetchgramError::InvalidMaxPayload);
        }
        let total = fragment_count(content.len(), max_payload);
        Ok(Self {
            content,
            max_payload,
            total,
            next_index: 0,
        })
    }

    /// Total number of fragments this fragmenter yields.
    pub fn total(&self) -> u32 {
        self.total
    }
}

impl Iterator for Fragmenter {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        if self.next_index >= self.total {
            return None;
        }

        let index = self.next_index;
        self.next_index += 1;

        let start = index as usize * self.max_payload;
        let end = (start + self.max_payload).min(self.content.len());
        let payload = self.content.slice(start..end);

        Some(Fragment {
            index,
            total: self.total,
            payload,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.next_index) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Fragmenter {}
