//! Fetch-and-deliver request/response protocol over UDP.
//!
//! A requester asks a responder to fetch a named resource and deliver its
//! content within a time budget. The responder fragments the content into
//! fixed-size datagrams, sends them back-to-back, and waits on a dedicated
//! acknowledgment port for a single ack, retrying the whole transmission
//! once before giving up.
//!
//! # Wire format
//!
//! Three datagram kinds flow between the peers:
//!
//! ```text
//! request   (requester -> responder, request port):
//!           <resource>,<budget_secs>
//!
//! fragment  (responder -> requester, requester's source port):
//!           <index>,<total>,<payload_len>xxx<payload bytes>
//!
//! ack       (requester -> responder, ack port):
//!           opaque; presence alone is significant
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::sync::Arc;
//! use fetchgram::{HttpFetcher, ProtocolConfig, Requester, Responder};
//!
//! // Responder side.
//! let fetch = Arc::new(HttpFetcher::new().unwrap());
//! let mut responder = Responder::bind(ProtocolConfig::default(), fetch).unwrap();
//! std::thread::spawn(move || responder.run());
//!
//! // Requester side.
//! let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
//! let mut requester = Requester::new(ProtocolConfig::default(), localhost).unwrap();
//! let outcome = requester.fetch("example.com", 5).unwrap();
//! ```
//!
//! The transport provides no ordering or delivery guarantees. Individual
//! fragment loss is not detected; only loss of the whole response (or of
//! the ack) is, via the requester's receive timeout and the responder's
//! ack-timeout retry.

pub mod config;
pub mod error;
pub mod fetch;
pub mod fragment;
pub mod reassembly;
pub mod request;
pub mod requester;
pub mod responder;
pub mod session;

// Re-export commonly used types at the crate root
pub use config::ProtocolConfig;
pub use error::{FetchgramError, Result};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::ResourceFetch;
pub use fragment::{Fragment, Fragmenter, fragment_count};
pub use reassembly::ReassemblyBuffer;
pub use request::Request;
pub use requester::{FetchOutcome, Requester};
pub use responder::{Responder, ShutdownHandle};
pub use session::{Session, SessionOutcome};
