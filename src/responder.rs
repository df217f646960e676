//! Responder: request receive loop and session dispatch.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::config::ProtocolConfig;
use crate::error::Result;
use crate::fetch::ResourceFetch;
use crate::request::Request;
use crate::session::Session;

/// How often the receive loop checks the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Stops a running [`Responder`] from another thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    /// Ask the receive loop to stop after its current poll.
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Listens for requests and answers each one on its own session thread.
///
/// The receive loop itself only decodes requests and spawns sessions; it
/// never blocks on a session's fetch, transmit, or acknowledgment wait.
pub struct Responder {
    socket: UdpSocket,
    config: ProtocolConfig,
    fetch: Arc<dyn ResourceFetch>,
    shutdown: Arc<AtomicBool>,
    recv_buffer: Vec<u8>,
}

impl Responder {
    /// Bind the request socket on the configured port.
    pub fn bind(config: ProtocolConfig, fetch: Arc<dyn ResourceFetch>) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", config.request_port))?;
        socket.set_read_timeout(Some(SHUTDOWN_POLL))?;

        let recv_buffer = vec![0u8; config.recv_buffer_len()];
        Ok(Self {
            socket,
            config,
            fetch,
            shutdown: Arc::new(AtomicBool::new(false)),
            recv_buffer,
        })
    }

    /// Get the local address of the request socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Get a handle that stops the receive loop.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// Run the receive loop until shut down.
    ///
    /// Malformed request datagrams are logged and dropped; they never end
    /// the loop.
    pub fn run(&mut self) -> Result<()> {
        info!("listening on {}", self.local_addr()?);

        while !self.shutdown.load(Ordering::Relaxed) {
            let (len, peer) = match self.socket.recv_from(&mut self.recv_buffer) {
                Ok(received) => received,
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let request = match Request::from_bytes(&self.recv_buffer[..len]) {
                Ok(request) => request,
                Err(e) => {
                    warn!("dropping datagram from {peer}: {e}");
                    continue;
                }
            };

            info!(
                "request from {peer}: {} within {} s",
                request.resource, request.budget_secs
            );
            self.spawn_session(request, peer)?;
        }

        info!("responder stopped");
        Ok(())
    }

    /// Hand one request off to a dedicated session thread.
    fn spawn_session(&self, request: Request, peer: SocketAddr) -> Result<()> {
        let data_socket = self.socket.try_clone()?;
        let config = self.config.clone();
        let fetch = Arc::clone(&self.fetch);

        thread::spawn(move || {
            Session::new(request, peer, data_socket, config).run(fetch.as_ref());
        });
        Ok(())
    }
}
