//! Command-line entry point for the interactive client.
//!
//! Shared by the `streamline-client` binary and the
//! `streamline --mode client` mode selector.

use std::io;

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use streamline_core::ConfigFile;

use crate::client::{connect, spawn_stdin_reader, Session, SessionEnd};
use crate::error::ClientError;
use crate::settings::{ClientArgs, ClientSettings};
use crate::ui::{Printer, SemanticColor};

/// Process exit code for a session that ended normally.
pub const EXIT_OK: i32 = 0;

/// Process exit code for rejections and connection failures.
pub const EXIT_FAILURE: i32 = 1;

/// Initializes logging to stderr, keeping the chat on stdout readable.
///
/// Honours `RUST_LOG`; defaults to warnings only.
pub fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("streamline_client=warn".parse()?),
        )
        .init();
    Ok(())
}

/// Prompts for missing settings, then runs one chat session.
///
/// Returns the process exit code. Expected failures (bad input, refused
/// connection, rejection) are printed for the user and map to
/// [`EXIT_FAILURE`]; only terminal I/O failures surface as errors.
pub fn run(args: ClientArgs) -> Result<i32> {
    let mut printer = Printer::stdout();
    printer.status("Welcome to StreamLine! Running client...", SemanticColor::Info)?;

    let file = match ConfigFile::discover(args.config.as_deref()) {
        Ok(file) => file,
        Err(e) => return report(&mut printer, &ClientError::from(e)),
    };

    let settings = {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        ClientSettings::resolve(args, &file, &mut input, &mut output, printer.colored())
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => return report(&mut printer, &e),
    };

    run_session(settings, printer)
}

#[tokio::main]
async fn run_session(settings: ClientSettings, mut printer: Printer<io::Stdout>) -> Result<i32> {
    let stream = match connect(&settings).await {
        Ok(stream) => stream,
        Err(e) => return report(&mut printer, &e),
    };
    info!(address = %settings.address(), "Connected to server");

    let mut session = Session::new(stream);
    if let Err(e) = session.handshake(&settings, &mut printer).await {
        return report(&mut printer, &e);
    }

    let input = spawn_stdin_reader();
    let end = tokio::select! {
        end = session.run(input, &mut printer) => end,
        _ = tokio::signal::ctrl_c() => {
            debug!("Interrupted");
            Ok(SessionEnd::UserExit)
        }
    };

    match end {
        Ok(SessionEnd::UserExit) | Ok(SessionEnd::ServerClosed) => Ok(EXIT_OK),
        Ok(SessionEnd::Rejected(_)) => Ok(EXIT_FAILURE),
        Err(ClientError::Io(e)) => Err(e).context("Terminal I/O failed"),
        Err(e) => report(&mut printer, &e),
    }
}

fn report<W: io::Write>(printer: &mut Printer<W>, error: &ClientError) -> Result<i32> {
    debug!(error = %error, "Client stopped");
    printer.status(&error.to_string(), SemanticColor::Error)?;
    Ok(EXIT_FAILURE)
}
