//! Connection settings: command-line flags, config defaults, and prompts.
//!
//! Each value comes from its flag when given. Otherwise the user is
//! prompted, with the config file (or a built-in value) as the default
//! that an empty answer selects.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use streamline_core::{ConfigFile, Nickname, NicknamePolicy};

use crate::error::{ClientError, Result};
use crate::ui::{paint, SemanticColor};

/// Host offered when neither flag nor config names one
pub const DEFAULT_HOST: &str = "localhost";

/// Port offered when neither flag nor config names one
pub const DEFAULT_PORT: u16 = 12345;

/// Client options.
#[derive(Args, Debug, Clone, Default)]
pub struct ClientArgs {
    /// Server host name or address
    #[arg(long)]
    pub host: Option<String>,

    /// Server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Server password (empty for none)
    #[arg(long)]
    pub password: Option<String>,

    /// Nickname to join with
    #[arg(long)]
    pub nickname: Option<String>,

    /// PEM file with the CA that signed the server certificate; enables TLS
    #[arg(long)]
    pub tls_ca: Option<PathBuf>,

    /// Path to config.json
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Everything needed to connect and join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub nickname: Nickname,
    pub tls_ca: Option<PathBuf>,
}

impl ClientSettings {
    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Fills in missing values by prompting on `input`/`output`.
    pub fn resolve<R: BufRead, W: Write>(
        args: ClientArgs,
        file: &ConfigFile,
        input: &mut R,
        output: &mut W,
        colored: bool,
    ) -> Result<Self> {
        let mut prompter = Prompter {
            input,
            output,
            colored,
        };

        let host = match args.host {
            Some(host) => host,
            None => {
                let default = file.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string());
                prompter.ask_with_default("Enter server host", &default)?
            }
        };

        let port = match args.port {
            Some(port) => port,
            None => {
                let default = file.port.filter(|p| *p != 0).unwrap_or(DEFAULT_PORT);
                let answer = prompter.ask_with_default("Enter server port", &default.to_string())?;
                parse_port(&answer)?
            }
        };

        let password = match args.password {
            Some(password) => password,
            None => prompter.ask("Enter server password (if any): ")?,
        };
        let password = Some(password).filter(|p| !p.is_empty());

        let raw_nickname = match args.nickname {
            Some(nickname) => nickname,
            None => prompter.ask("Choose your nickname: ")?,
        };
        let policy = NicknamePolicy {
            require_alphanumeric: file.require_alphanumeric.unwrap_or(true),
            ..NicknamePolicy::default()
        };
        let nickname = policy.validate(&raw_nickname)?;

        debug!(host = %host, port, nickname = %nickname, "Client settings resolved");

        Ok(Self {
            host,
            port,
            password,
            nickname,
            tls_ca: args.tls_ca,
        })
    }
}

fn parse_port(answer: &str) -> Result<u16> {
    match answer.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ClientError::InvalidPort(answer.trim().to_string())),
    }
}

struct Prompter<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
    colored: bool,
}

impl<R: BufRead, W: Write> Prompter<'_, R, W> {
    /// Prints `question` and reads one trimmed answer. EOF is an empty answer.
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}", paint(question, SemanticColor::Warning, self.colored))?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }

    fn ask_with_default(&mut self, label: &str, default: &str) -> Result<String> {
        let answer = self.ask(&format!("{label} (default: {default}): "))?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }
}

/// Reads a one-line answer to `question` from stdin.
///
/// Used by the mode selector.
pub fn ask_stdin(question: &str, colored: bool) -> Result<String> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    Prompter {
        input: &mut input,
        output: &mut output,
        colored,
    }
    .ask(question)
}
