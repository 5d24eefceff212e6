//! Turning server lines into terminal output.

use std::io::{self, Write};

use chrono::Local;
use streamline_protocol::ServerLine;

use super::theme::{paint, SemanticColor};

/// Local wall-clock time as `HH:MM:SS`.
pub fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Renders one classified line, prefixed with `stamp`.
pub fn render_line(line: &ServerLine, stamp: &str, colored: bool) -> String {
    let stamp = paint(&format!("[{stamp}]"), SemanticColor::Info, colored);
    let body = match line {
        ServerLine::Chat { nickname, text } => format!(
            "{}: {}",
            paint(nickname, SemanticColor::Accent, colored),
            paint(text, SemanticColor::Chat, colored)
        ),
        ServerLine::Joined(nickname) => {
            paint(&format!("{nickname} joined"), SemanticColor::Success, colored)
        }
        ServerLine::Left(nickname) => {
            paint(&format!("{nickname} left"), SemanticColor::Error, colored)
        }
        ServerLine::Rejected(reason) => paint(reason, SemanticColor::Error, colored),
        ServerLine::PasswordAccepted => paint(
            streamline_protocol::PASSWORD_ACCEPTED,
            SemanticColor::Success,
            colored,
        ),
        ServerLine::PasswordPrompt | ServerLine::NickRequest => {
            paint("(server requested a new handshake step)", SemanticColor::Warning, colored)
        }
        ServerLine::Notice(text) => paint(text, SemanticColor::Warning, colored),
    };
    format!("{stamp} {body}")
}

/// Writes rendered lines and status messages to a terminal (or any writer).
pub struct Printer<W: Write> {
    out: W,
    colored: bool,
}

impl Printer<io::Stdout> {
    /// Printer on stdout, colored when stdout is a terminal.
    pub fn stdout() -> Self {
        Self::new(io::stdout(), super::theme::color_enabled())
    }
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, colored: bool) -> Self {
        Self { out, colored }
    }

    pub fn colored(&self) -> bool {
        self.colored
    }

    /// Prints a line received from the server.
    pub fn server_line(&mut self, line: &ServerLine) -> io::Result<()> {
        writeln!(self.out, "{}", render_line(line, &timestamp(), self.colored))?;
        self.out.flush()
    }

    /// Prints a local status message.
    pub fn status(&mut self, text: &str, color: SemanticColor) -> io::Result<()> {
        writeln!(self.out, "{}", paint(text, color, self.colored))?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
