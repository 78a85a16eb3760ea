//! Rust NFT Exchange CLI
//!
//! Runs the NFT lifecycle demonstration against an in-process development
//! ledger: two funded accounts, one NFT created and minted by the creator,
//! an opt-in by the buyer, and a negotiated sale.
//!
//! # Usage
//!
//! ```bash
//! cargo run
//! cargo run -- --price 2.5 --demo-opt-out
//! cargo run -- --format csv > balances.csv
//! RUST_LOG=rust_nft_exchange=debug cargo run
//! ```
//!
//! Narration and balances go to stdout, logs to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (invalid amount, rejected transaction, failed negotiation, etc.)

use rust_nft_exchange::cli;
use rust_nft_exchange::scenario::Scenario;
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::parse_args();

    let config = match args.to_scenario_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut output = std::io::stdout();
    if let Err(e) = Scenario::new(config).run(&mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
