//! Response reassembly from received fragments.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FetchgramError, Result};
use crate::fragment::Fragment;

/// Accumulates received fragments and detects completion.
///
/// Payloads are keyed by fragment index rather than appended in arrival
/// order, so retransmitted duplicates overwrite themselves and reordered
/// datagrams still reassemble correctly. The buffer learns the expected
/// fragment count from the first fragment it sees and rejects fragments
/// that disagree.
#[derive(Debug, Default)]
pub struct ReassemblyBuffer {
    fragments: BTreeMap<u32, Bytes>,
    total: Option<u32>,
}

impl ReassemblyBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept one received fragment.
    ///
    /// Returns `Ok(true)` once every index in `[0, total)` has been
    /// accepted. Accepting the same index twice is idempotent.
    pub fn accept(&mut self, fragment: Fragment) -> Result<bool> {
        if fragment.index >= fragment.total {
            return Err(FetchgramError::malformed_fragment(format!(
                "index {} out of range for total {}",
                fragment.index, fragment.total
            )));
        }

        match self.total {
            Some(total) if total != fragment.total => {
                return Err(FetchgramError::TotalMismatch {
                    expected: total,
                    actual: fragment.total,
                });
            }
            Some(_) => {}
            None => self.total = Some(fragment.total),
        }

        self.fragments.insert(fragment.index, fragment.payload);
        Ok(self.is_complete())
    }

    /// Check whether every fragment has been accepted.
    pub fn is_complete(&self) -> bool {
        self.total
            .is_some_and(|total| self.fragments.len() as u32 == total)
    }

    /// Number of distinct fragments accepted so far.
    pub fn received(&self) -> u32 {
        self.fragments.len() as u32
    }

    /// Concatenate the payloads in index order.
    ///
    /// Fails with [`FetchgramError::IncompleteReassembly`] when called
    /// before completion.
    pub fn into_bytes(self) -> Result<Bytes> {
        if !self.is_complete() {
            return Err(FetchgramError::IncompleteReassembly {
                have: self.fragments.len() as u32,
                total: self.total.unwrap_or(0),
            });
        }

        let len = self.fragments.values().map(Bytes::len).sum();
        let mut content = BytesMut::with_capacity(len);
        for payload in self.fragments.values() {
            content.put_slice(payload);
        }
        Ok(content.freeze())
    }
}
