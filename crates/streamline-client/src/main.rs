//! StreamLine client - join a relay from the terminal
//!
//! # Usage
//!
//! ```text
//! streamline-client                                  # prompt for everything
//! streamline-client --host chat.lan --port 5050 --nickname alice
//! streamline-client --host chat.lan --tls-ca ca.pem  # TLS, trusting ca.pem
//! ```
//!
//! Type `/exit` to leave.

use anyhow::Result;
use clap::Parser;

use streamline_client::cli;
use streamline_client::settings::ClientArgs;
use streamline_client::ui::{color_enabled, render_banner};

/// StreamLine interactive client
#[derive(Parser, Debug)]
#[command(name = "streamline-client", version, about)]
struct Args {
    #[command(flatten)]
    client: ClientArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_logging()?;

    print!("{}", render_banner(color_enabled()));
    let code = cli::run(args.client)?;
    std::process::exit(code);
}
