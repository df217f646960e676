//! Requester binary.
//!
//! Prompts for a web server name and a timer value, requests the resource
//! from the responder, and prints the reassembled content followed by `OK`,
//! or `FAIL` when the response was late or never completed.

use std::io::{self, BufRead, Write};
use std::net::IpAddr;
use std::process;

use clap::Parser;
use log::error;

use fetchgram::config::DEFAULT_REQUEST_PORT;
use fetchgram::{FetchOutcome, ProtocolConfig, Requester};

#[derive(Parser, Debug)]
#[command(name = "fetchgram-requester")]
#[command(about = "Requests a web resource from a fetchgram responder")]
#[command(version)]
struct Args {
    /// Responder address
    #[arg(long, default_value = "127.0.0.1")]
    server: IpAddr,

    /// Responder request port
    #[arg(long, default_value_t = DEFAULT_REQUEST_PORT)]
    port: u16,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let resource = prompt("Enter the web server name: ")?;
    let budget_secs: u64 = match prompt("Enter timer value in seconds: ")?.parse() {
        Ok(secs) if secs > 0 => secs,
        _ => {
            eprintln!("timer value must be a positive integer");
            process::exit(1);
        }
    };

    let config = ProtocolConfig::default().with_request_port(args.port);
    let mut requester = Requester::new(config, args.server)?;

    match requester.fetch(&resource, budget_secs) {
        Ok(FetchOutcome::Delivered(content)) => {
            println!("\n{}\n", String::from_utf8_lossy(&content));
            println!("OK");
        }
        Ok(FetchOutcome::Late | FetchOutcome::TimedOut) => {
            println!("\nFAIL");
        }
        Err(e) => {
            error!("request failed: {e}");
            println!("\nFAIL");
        }
    }

    Ok(())
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{message}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
