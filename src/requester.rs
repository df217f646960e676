//! Requester: send a request, reassemble the response, decide the outcome.

use std::io;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::time::Instant;

use bytes::Bytes;
use log::{debug, info, warn};

use crate::config::ProtocolConfig;
use crate::error::Result;
use crate::fragment::Fragment;
use crate::reassembly::ReassemblyBuffer;
use crate::request::Request;

/// What one request attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Complete response within the time budget; the ack was sent.
    Delivered(Bytes),
    /// Complete response, but the budget had elapsed; no ack was sent, so
    /// the responder sees this the same as a lost acknowledgment.
    Late,
    /// The receive timeout fired before the response completed.
    TimedOut,
}

impl FetchOutcome {
    /// Check if the request succeeded.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}

/// Sends requests to one responder and reassembles the answers.
///
/// Fully synchronous: `fetch` blocks on the receive loop and returns only
/// once the response is complete or the receive timeout fires.
pub struct Requester {
    socket: UdpSocket,
    config: ProtocolConfig,
    responder: IpAddr,
    recv_buffer: Vec<u8>,
}

impl Requester {
    /// Create a requester talking to the responder at `responder`.
    ///
    /// The local socket is ephemeral; the responder replies to whatever
    /// source address the request arrives from.
    pub fn new(config: ProtocolConfig, responder: IpAddr) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_read_timeout(Some(config.recv_timeout))?;

        let recv_buffer = vec![0u8; config.recv_buffer_len()];
        Ok(Self {
            socket,
            config,
            responder,
            recv_buffer,
        })
    }

    /// Request `resource` with a time budget of `budget_secs` seconds.
    ///
    /// Sends the request, reassembles the fragment stream, and decides the
    /// outcome against the budget. A response that completes after the
    /// budget is *not* acknowledged; the responder's own retry/failure path
    /// handles it from there.
    pub fn fetch(&mut self, resource: &str, budget_secs: u64) -> Result<FetchOutcome> {
        let request = Request::new(resource, budget_secs)?;
        let started = Instant::now();

        let request_addr = SocketAddr::new(self.responder, self.config.request_port);
        self.socket.send_to(&request.to_bytes(), request_addr)?;
        debug!("sent request for {resource} to {request_addr}");

        let Some(content) = self.receive_response()? else {
            warn!("{resource}: no complete response within {:?}", self.config.recv_timeout);
            return Ok(FetchOutcome::TimedOut);
        };

        let elapsed = started.elapsed();
        if elapsed < request.budget() {
            self.send_ack()?;
            info!("{resource}: {} bytes in {elapsed:?}", content.len());
            Ok(FetchOutcome::Delivered(content))
        } else {
            info!(
                "{resource}: response complete after {elapsed:?}, over the {budget_secs} s budget; not acknowledging"
            );
            Ok(FetchOutcome::Late)
        }
    }

    /// Receive fragments until the response completes or a receive times out.
    ///
    /// Malformed datagrams and fragments the buffer rejects are logged and
    /// dropped; only a timeout ends the loop early.
    fn receive_response(&mut self) -> Result<Option<Bytes>> {
        let mut buffer = ReassemblyBuffer::new();

        loop {
            let (len, from) = match self.socket.recv_from(&mut self.recv_buffer) {
                Ok(received) => received,
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            let fragment = match Fragment::from_bytes(&self.recv_buffer[..len]) {
                Ok(fragment) => fragment,
                Err(e) => {
                    warn!("dropping datagram from {from}: {e}");
                    continue;
                }
            };

            match buffer.accept(fragment) {
                Ok(true) => return buffer.into_bytes().map(Some),
                Ok(false) => {}
                Err(e) => warn!("dropping fragment from {from}: {e}"),
            }
        }
    }

    /// Send the single acknowledgment datagram to the responder's ack port.
    fn send_ack(&self) -> Result<()> {
        let ack_addr = SocketAddr::new(self.responder, self.config.ack_port);
        self.socket.send_to(b"ACK", ack_addr)?;
        debug!("sent acknowledgment to {ack_addr}");
        Ok(())
    }

    /// Get the local address of the request socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use crate::error::FetchgramError;
    use crate::responder::Responder;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    fn run_responder(
        config: ProtocolConfig,
        fetch: Arc<dyn crate::ResourceFetch>,
    ) -> (crate::responder::ShutdownHandle, thread::JoinHandle<Result<()>>) {
        let mut responder = Responder::bind(config, fetch).unwrap();
        let handle = responder.shutdown_handle();
        let thread = thread::spawn(move || responder.run());
        (handle, thread)
    }

    #[test]
    fn test_happy_path_delivery() {
        let config = ProtocolConfig::default()
            .with_request_port(45201)
            .with_ack_port(45202)
            .with_ack_timeout(Duration::from_millis(300))
            .with_recv_timeout(Duration::from_secs(2));

        let content: Vec<u8> = (0..2500u16).map(|i| (i % 256) as u8).collect();
        let expected = Bytes::from(content);
        let served = expected.clone();
        let fetch = move |_: &str| -> Result<Bytes> { Ok(served.clone()) };

        let (shutdown, responder_thread) = run_responder(config.clone(), Arc::new(fetch));

        let mut requester = Requester::new(config, LOCALHOST).unwrap();
        let outcome = requester.fetch("example.com", 30).unwrap();

        assert_eq!(outcome, FetchOutcome::Delivered(expected));

        shutdown.shutdown();
        responder_thread.join().unwrap().unwrap();
    }

    #[test]
    fn test_fetch_failure_times_out() {
        let config = ProtocolConfig::default()
            .with_request_port(45211)
            .with_ack_port(45212)
            .with_ack_timeout(Duration::from_millis(100))
            .with_recv_timeout(Duration::from_millis(300));

        let fetch =
            |resource: &str| -> Result<Bytes> { Err(FetchgramError::fetch(resource, "down")) };

        let (shutdown, responder_thread) = run_responder(config.clone(), Arc::new(fetch));

        let mut requester = Requester::new(config, LOCALHOST).unwrap();
        let outcome = requester.fetch("example.com", 30).unwrap();
        assert_eq!(outcome, FetchOutcome::TimedOut);

        shutdown.shutdown();
        responder_thread.join().unwrap().unwrap();
    }

    #[test]
    fn test_no_responder_times_out() {
        // Nothing is listening on this port pair at all.
        let config = ProtocolConfig::default()
            .with_request_port(45221)
            .with_ack_port(45222)
            .with_recv_timeout(Duration::from_millis(200));

        let mut requester = Requester::new(config, LOCALHOST).unwrap();
        let outcome = requester.fetch("example.com", 5).unwrap();
        assert_eq!(outcome, FetchOutcome::TimedOut);
    }

    #[test]
    fn test_late_response_is_not_acknowledged() {
        let config = ProtocolConfig::default()
            .with_request_port(45231)
            .with_ack_port(45232)
            .with_ack_timeout(Duration::from_millis(200))
            .with_recv_timeout(Duration::from_secs(3));

        // The origin is slower than the requester's one-second budget.
        let fetch = |_: &str| -> Result<Bytes> {
            thread::sleep(Duration::from_millis(1200));
            Ok(Bytes::from_static(b"slow content"))
        };

        let (shutdown, responder_thread) = run_responder(config.clone(), Arc::new(fetch));

        let mut requester = Requester::new(config.clone(), LOCALHOST).unwrap();
        let outcome = requester.fetch("example.com", 1).unwrap();
        assert_eq!(outcome, FetchOutcome::Late);

        // No ack was sent: the session must still be waiting on the ack
        // port, so binding it here fails until its timeout expires.
        thread::sleep(Duration::from_millis(50));
        assert!(UdpSocket::bind(("0.0.0.0", config.ack_port)).is_err());

        shutdown.shutdown();
        responder_thread.join().unwrap().unwrap();
    }

    #[test]
    fn test_duplicate_fragments_from_retransmission() {
        // An unacknowledged responder retransmits every fragment; a
        // requester that is still listening must reassemble the same
        // content, not a doubled one.
        let config = ProtocolConfig::default()
            .with_request_port(45241)
            .with_ack_port(45242)
            .with_max_payload(4);

        let content = Bytes::from_static(b"duplicated stream");
        let fragments: Vec<Fragment> =
            crate::fragment::Fragmenter::new(content.clone(), config.max_payload)
                .unwrap()
                .collect();

        let mut buffer = ReassemblyBuffer::new();
        let mut complete = false;
        // Two full transmissions, as seen after one ack-timeout resend.
        for fragment in fragments.iter().chain(fragments.iter()) {
            complete = buffer.accept(fragment.clone()).unwrap();
        }
        assert!(complete);
        assert_eq!(buffer.into_bytes().unwrap(), content);
    }
}
