//! StreamLine server - multi-client chat relay
//!
//! # Usage
//!
//! ```bash
//! # Start with config.json defaults (free port if none configured)
//! streamlined
//!
//! # Explicit port and password
//! streamlined --port 5050 --password hunter2
//!
//! # Use a specific config file
//! STREAMLINE_CONFIG=/etc/streamline/config.json streamlined
//!
//! # Enable debug logging
//! RUST_LOG=streamlined=debug streamlined
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful shutdown

use anyhow::Result;
use clap::Parser;

use streamlined::cli::{self, ServerArgs};

/// StreamLine relay server
#[derive(Parser, Debug)]
#[command(name = "streamlined", version, about)]
struct Args {
    #[command(flatten)]
    server: ServerArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    run_server(args.server)
}

#[tokio::main]
async fn run_server(args: ServerArgs) -> Result<()> {
    cli::init_logging()?;
    cli::run(args).await
}
