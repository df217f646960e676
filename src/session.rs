//! Responder-side per-request session.
//!
//! A session handles one inbound request end to end: fetch the resource,
//! transmit it as fragments, and wait for the requester's acknowledgment,
//! with a single bounded retry when the acknowledgment does not arrive.
//! Sessions run on dedicated threads so the responder's receive loop is
//! never blocked by fetch, transmit, or acknowledgment-wait latency.

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use bytes::Bytes;
use log::{debug, info, warn};

use crate::config::ProtocolConfig;
use crate::error::Result;
use crate::fetch::ResourceFetch;
use crate::fragment::Fragmenter;
use crate::request::Request;

/// Total transmit attempts per session: the initial one plus one retry.
const MAX_ATTEMPTS: u32 = 2;

/// Terminal state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Acknowledged within the requester's time budget.
    Done,
    /// Acknowledged, but only after the time budget had elapsed.
    Resent,
    /// Fetch failed, or no acknowledgment arrived after the retry.
    Failed,
}

impl SessionOutcome {
    /// Decide the acknowledged outcome from elapsed time and budget.
    pub fn from_timing(elapsed: Duration, budget: Duration) -> Self {
        if elapsed < budget {
            Self::Done
        } else {
            Self::Resent
        }
    }
}

/// Result of one bounded acknowledgment wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AckWait {
    Received,
    TimedOut,
}

/// One request being answered: fetch, transmit, await acknowledgment.
#[derive(Debug)]
pub struct Session {
    request: Request,
    peer: SocketAddr,
    data_socket: UdpSocket,
    config: ProtocolConfig,
}

impl Session {
    /// Create a session for a request received from `peer`.
    ///
    /// `data_socket` is the responder's socket (or a clone of it); fragments
    /// are sent from it so the requester sees a consistent source.
    pub fn new(
        request: Request,
        peer: SocketAddr,
        data_socket: UdpSocket,
        config: ProtocolConfig,
    ) -> Self {
        Self {
            request,
            peer,
            data_socket,
            config,
        }
    }

    /// Run the session to completion.
    ///
    /// The wall clock starts here and runs across the retry, so a response
    /// that is only acknowledged on the second attempt is reported against
    /// the same budget as the first.
    pub fn run(self, fetch: &dyn ResourceFetch) -> SessionOutcome {
        let started = Instant::now();

        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(fetch) {
                Ok(AckWait::Received) => {
                    let outcome = SessionOutcome::from_timing(started.elapsed(), self.request.budget());
                    match outcome {
                        SessionOutcome::Done => info!("{}: DONE", self.request.resource),
                        _ => info!("{}: RESENT", self.request.resource),
                    }
                    return outcome;
                }
                Ok(AckWait::TimedOut) if attempt < MAX_ATTEMPTS => {
                    warn!(
                        "{}: no acknowledgment from {} within {:?}, resending",
                        self.request.resource, self.peer, self.config.ack_timeout
                    );
                }
                Ok(AckWait::TimedOut) => {
                    warn!(
                        "{}: no acknowledgment after {MAX_ATTEMPTS} attempts, giving up",
                        self.request.resource
                    );
                    return SessionOutcome::Failed;
                }
                Err(e) => {
                    warn!("{}: session failed: {e}", self.request.resource);
                    return SessionOutcome::Failed;
                }
            }
        }

        SessionOutcome::Failed
    }

    /// One fetch + transmit + acknowledgment wait.
    ///
    /// The resource is fetched anew on the retry as well, matching the
    /// one-shot nature of the origin contract.
    fn attempt(&self, fetch: &dyn ResourceFetch) -> Result<AckWait> {
        let content = fetch.fetch(&self.request.resource)?;
        self.transmit(content)?;
        self.wait_for_ack()
    }

    /// Send the content to the peer as back-to-back fragment datagrams.
    fn transmit(&self, content: Bytes) -> Result<()> {
        let fragmenter = Fragmenter::new(content, self.config.max_payload)?;
        debug!(
            "{}: sending {} fragments to {}",
            self.request.resource,
            fragmenter.total(),
            self.peer
        );

        for fragment in fragmenter {
            self.data_socket.send_to(&fragment.to_bytes(), self.peer)?;
        }
        Ok(())
    }

    /// Block on the acknowledgment port for at most the configured timeout.
    ///
    /// Any datagram on the port counts as the acknowledgment; its content is
    /// not inspected. The port is bound fresh per wait, so two sessions
    /// waiting at once lose the race on the second bind — that session
    /// fails, which is the documented limitation of the shared ack port.
    fn wait_for_ack(&self) -> Result<AckWait> {
        let socket = UdpSocket::bind(("0.0.0.0", self.config.ack_port))?;
        socket.set_read_timeout(Some(self.config.ack_timeout))?;

        let mut buf = [0u8; 64];
        match socket.recv_from(&mut buf) {
            Ok((_, from)) => {
                debug!("{}: acknowledgment from {from}", self.request.resource);
                Ok(AckWait::Received)
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(AckWait::TimedOut)
            }
            Err(e) => Err(e.into()),
        }
    }
}
