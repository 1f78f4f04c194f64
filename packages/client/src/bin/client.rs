//! Watch party terminal client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin watchparty-client -- --party movie-night --participant alice
//! ```

use clap::Parser;
use watchparty_client::run_client;
use watchparty_shared::logger::setup_logger;

#[derive(Debug, Parser)]
#[command(name = "watchparty-client", version, about = "Terminal client for a watch party")]
struct Args {
    /// Server base URL
    #[arg(short, long, default_value = "ws://127.0.0.1:8080")]
    url: String,

    /// Party to join
    #[arg(long)]
    party: String,

    /// Participant id to join as
    #[arg(long)]
    participant: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Keep the prompt readable; RUST_LOG still overrides
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let url = format!(
        "{}/ws/parties/{}?participant_id={}",
        args.url.trim_end_matches('/'),
        args.party,
        args.participant
    );

    if let Err(e) = run_client(&url, &args.party).await {
        tracing::error!("{}", e);
        eprintln!("{e}");
        std::process::exit(1);
    }
}
