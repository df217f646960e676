//! Responder binary.
//!
//! Listens on the request port, answers each request on its own session
//! thread, and shuts down when `stop` is typed on stdin.

use std::io::BufRead;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::error;

use fetchgram::config::DEFAULT_REQUEST_PORT;
use fetchgram::{HttpFetcher, ProtocolConfig, Responder};

#[derive(Parser, Debug)]
#[command(name = "fetchgram-responder")]
#[command(about = "Fetches web resources and delivers them over UDP fragments")]
#[command(version)]
struct Args {
    /// Port to listen on for requests
    #[arg(long, default_value_t = DEFAULT_REQUEST_PORT)]
    port: u16,

    /// Acknowledgment port (defaults to the request port + 1)
    #[arg(long)]
    ack_port: Option<u16>,

    /// Seconds to wait for an acknowledgment before resending
    #[arg(long, default_value_t = 3)]
    ack_timeout: u64,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = ProtocolConfig::default()
        .with_request_port(args.port)
        .with_ack_timeout(Duration::from_secs(args.ack_timeout));
    if let Some(port) = args.ack_port {
        config = config.with_ack_port(port);
    }

    let fetch = match HttpFetcher::new() {
        Ok(fetch) => Arc::new(fetch),
        Err(e) => {
            error!("failed to create HTTP client: {e}");
            process::exit(1);
        }
    };

    let mut responder = match Responder::bind(config, fetch) {
        Ok(responder) => responder,
        Err(e) => {
            error!("failed to bind request port {}: {e}", args.port);
            process::exit(1);
        }
    };

    // `stop` on stdin ends the receive loop.
    let shutdown = responder.shutdown_handle();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("stop") {
                shutdown.shutdown();
                break;
            }
        }
    });
    println!("Enter 'stop' to shut down the responder.");

    if let Err(e) = responder.run() {
        error!("responder error: {e}");
        process::exit(1);
    }
}
