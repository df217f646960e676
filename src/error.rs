//! Error types for fetchgram operations.

use std::io;
use thiserror::Error;

/// Errors that can occur during fetchgram operations.
#[derive(Error, Debug)]
pub enum FetchgramError {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Request datagram could not be decoded.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Fragment datagram could not be decoded.
    #[error("Malformed fragment: {0}")]
    MalformedFragment(String),

    /// Fragment declared a payload length that does not match the bytes on the wire.
    #[error("Fragment length mismatch: header says {declared} bytes, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// Fragment carried a total that disagrees with earlier fragments of the same response.
    #[error("Fragment total mismatch: expected {expected}, got {actual}")]
    TotalMismatch { expected: u32, actual: u32 },

    /// Maximum fragment payload size must be non-zero.
    #[error("Maximum fragment payload size must be greater than zero")]
    InvalidMaxPayload,

    /// Reassembled content was requested before all fragments arrived.
    #[error("Incomplete reassembly: have {have} of {total} fragments")]
    IncompleteReassembly { have: u32, total: u32 },

    /// Origin lookup failed.
    #[error("Fetch failed for {resource}: {reason}")]
    Fetch { resource: String, reason: String },

    /// Time budget must be a positive number of seconds.
    #[error("Time budget must be greater than zero")]
    BudgetZero,
}

/// Result type alias for fetchgram operations.
pub type Result<T> = std::result::Result<T, FetchgramError>;

impl FetchgramError {
    /// Create a new malformed request error.
    pub fn malformed_request(msg: impl Into<String>) -> Self {
        Self::MalformedRequest(msg.into())
    }

    /// Create a new malformed fragment error.
    pub fn malformed_fragment(msg: impl Into<String>) -> Self {
        Self::MalformedFragment(msg.into())
    }

    /// Create a new fetch error.
    pub fn fetch(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is a socket receive timeout.
    ///
    /// Both `WouldBlock` and `TimedOut` are produced by blocking reads on
    /// sockets with a read timeout, depending on platform.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(e) if e.kind() == io::ErrorKind::WouldBlock
                || e.kind() == io::ErrorKind::TimedOut
        )
    }
}
