//! Protocol configuration shared by both peers.
//!
//! The request port, acknowledgment port, fragment size, and timeouts must
//! match between requester and responder. They are injected at construction
//! time rather than read from globals, so tests can run isolated instances
//! on distinct port pairs.

use std::time::Duration;

use crate::fragment::MAX_HEADER_LEN;

/// Default UDP port the responder listens on for requests.
pub const DEFAULT_REQUEST_PORT: u16 = 11111;

/// Default maximum fragment payload size in bytes.
pub const DEFAULT_MAX_PAYLOAD: usize = 1000;

/// Default time a session waits for the acknowledgment before retrying.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(3);

/// Default time the requester waits for each fragment before giving up.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed protocol parameters shared by requester and responder.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Port the responder listens on for request datagrams.
    pub request_port: u16,
    /// Port the responder listens on for the acknowledgment datagram.
    ///
    /// By convention this is `request_port + 1`.
    pub ack_port: u16,
    /// Maximum payload bytes per fragment datagram.
    pub max_payload: usize,
    /// How long a session waits for the acknowledgment per attempt.
    pub ack_timeout: Duration,
    /// How long the requester waits for each fragment.
    pub recv_timeout: Duration,
}

impl ProtocolConfig {
    /// Create a config with the default ports, fragment size, and timeouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request port and derive the ack port as `request_port + 1`.
    pub fn with_request_port(mut self, port: u16) -> Self {
        self.request_port = port;
        self.ack_port = port.wrapping_add(1);
        self
    }

    /// Set the acknowledgment port explicitly.
    pub fn with_ack_port(mut self, port: u16) -> Self {
        self.ack_port = port;
        self
    }

    /// Set the maximum fragment payload size.
    pub fn with_max_payload(mut self, size: usize) -> Self {
        self.max_payload = size;
        self
    }

    /// Set the acknowledgment wait timeout.
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Set the per-fragment receive timeout.
    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Receive buffer size large enough for any legal fragment datagram.
    pub fn recv_buffer_len(&self) -> usize {
        self.max_payload + MAX_HEADER_LEN
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            request_port: DEFAULT_REQUEST_PORT,
            ack_port: DEFAULT_REQUEST_PORT + 1,
            max_payload: DEFAULT_MAX_PAYLOAD,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            recv_timeout: DEFAULT_RECV_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProtocolConfig::default();
        assert_eq!(config.request_port, 11111);
        assert_eq!(config.ack_port, 11112);
        assert_eq!(config.max_payload, 1000);
        assert_eq!(config.ack_timeout, Duration::from_secs(3));
        assert_eq!(config.recv_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_request_port_derives_ack_port() {
        let config = ProtocolConfig::default().with_request_port(40000);
        assert_eq!(config.request_port, 40000);
        assert_eq!(config.ack_port, 40001);

        let config = config.with_ack_port(40100);
        assert_eq!(config.ack_port, 40100);
    }

    #[test]
    fn test_recv_buffer_covers_largest_datagram() {
        let config = ProtocolConfig::default();
        assert!(config.recv_buffer_len() > config.max_payload);

        let config = config.with_max_payload(64);
        assert!(config.recv_buffer_len() > 64);
    }
}
