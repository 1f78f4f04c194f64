//! Watch party server: keeps every participant's playback in sync.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin watchparty-server -- --port 8080
//! cargo run --bin watchparty-server -- --config watchparty.toml
//! ```

use std::path::PathBuf;

use clap::Parser;
use watchparty_server::{config::Settings, ui};
use watchparty_shared::logger::setup_logger;

#[derive(Debug, Parser)]
#[command(name = "watchparty-server", version, about = "Synchronized playback server for watch parties")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let mut settings = match &args.config {
        Some(path) => match Settings::from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    // Run the server
    if let Err(e) = ui::run(settings).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
