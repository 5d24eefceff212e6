//! StreamLine - run a chat relay server or join one as a client
//!
//! # Usage
//!
//! ```text
//! streamline                      # banner, then "Choose mode" prompt
//! streamline --mode server --port 5050 --password hunter2
//! streamline --mode client --host chat.lan --nickname alice
//! ```
//!
//! # Exit Codes
//!
//! - 0: normal exit (including Ctrl-C on the server)
//! - 1: invalid mode choice, configuration or connection failure, rejection

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{error, info};

use streamline_client::settings::{ask_stdin, ClientArgs};
use streamline_client::ui::{color_enabled, render_banner, Printer, SemanticColor};
use streamlined::cli::{self as server_cli, ServerArgs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Server,
    Client,
}

/// StreamLine chat relay
#[derive(Parser, Debug)]
#[command(name = "streamline", version, about)]
struct Args {
    /// Run as server or client; prompts when omitted
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Server: address to bind. Client: server to connect to
    #[arg(long)]
    host: Option<String>,

    /// Server: port to bind. Client: port to connect to
    #[arg(long)]
    port: Option<u16>,

    /// Server: password to require. Client: password to send
    #[arg(long)]
    password: Option<String>,

    /// Path to config.json
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server: connections relayed concurrently
    #[arg(long)]
    max_workers: Option<usize>,

    /// Server: accept nicknames beyond letters and digits
    #[arg(long)]
    allow_any_nickname: bool,

    /// Client: nickname to join with
    #[arg(long)]
    nickname: Option<String>,

    /// Client: CA certificate (PEM) for a TLS connection
    #[arg(long)]
    tls_ca: Option<PathBuf>,
}

impl Args {
    fn server_args(&self) -> ServerArgs {
        ServerArgs {
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone(),
            max_workers: self.max_workers,
            config: self.config.clone(),
            allow_any_nickname: self.allow_any_nickname,
        }
    }

    fn client_args(&self) -> ClientArgs {
        ClientArgs {
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone(),
            nickname: self.nickname.clone(),
            tls_ca: self.tls_ca.clone(),
            config: self.config.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    server_cli::init_logging()?;

    let colored = color_enabled();
    print!("{}", render_banner(colored));

    let mode = match args.mode {
        Some(mode) => mode,
        None => match choose_mode(colored)? {
            Some(mode) => mode,
            None => {
                error!("Invalid mode choice");
                Printer::stdout().status("Invalid choice. Exiting.", SemanticColor::Error)?;
                std::process::exit(1);
            }
        },
    };

    let code = match mode {
        Mode::Server => {
            info!("Starting server mode");
            match run_server(args.server_args()) {
                Ok(()) => 0,
                Err(e) => {
                    error!(error = %e, "Server failed");
                    eprintln!("Error: {e:#}");
                    1
                }
            }
        }
        Mode::Client => {
            info!("Starting client mode");
            streamline_client::cli::run(args.client_args())?
        }
    };

    std::process::exit(code);
}

/// Interactive menu. `None` means the answer was not a valid choice.
fn choose_mode(colored: bool) -> Result<Option<Mode>> {
    let mut printer = Printer::stdout();
    printer.status("Choose mode:", SemanticColor::Chat)?;
    printer.status("1. Server", SemanticColor::Info)?;
    printer.status("2. Client", SemanticColor::Info)?;

    let answer = ask_stdin("Enter your choice (1/2): ", colored)?;
    Ok(parse_choice(&answer))
}

fn parse_choice(answer: &str) -> Option<Mode> {
    match answer.trim() {
        "1" => Some(Mode::Server),
        "2" => Some(Mode::Client),
        _ => None,
    }
}

#[tokio::main]
async fn run_server(args: ServerArgs) -> Result<()> {
    server_cli::run(args).await
}
