//! Shared color vocabulary for terminal output.
//!
//! Colors exist only here, at print time. Nothing colored is ever sent to
//! the server.

use std::io::IsTerminal;

use crossterm::style::{Color, Stylize};

/// What a piece of text means, independent of how it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticColor {
    /// Neutral status (prompts, connection info)
    Info,
    /// Something succeeded or someone joined
    Success,
    /// Needs attention (notices, input prompts)
    Warning,
    /// Failure, rejection, departure
    Error,
    /// Relayed chat text
    Chat,
    /// Highlights such as nicknames
    Accent,
}

impl SemanticColor {
    /// Terminal color for this role. `None` keeps the terminal's default.
    pub fn color(self) -> Option<Color> {
        match self {
            SemanticColor::Info => Some(Color::Cyan),
            SemanticColor::Success => Some(Color::Green),
            SemanticColor::Warning => Some(Color::Yellow),
            SemanticColor::Error => Some(Color::Red),
            SemanticColor::Chat => None,
            SemanticColor::Accent => Some(Color::Magenta),
        }
    }
}

/// Wraps `text` in the ANSI styling for `color`.
pub fn format(text: &str, color: SemanticColor) -> String {
    match color.color() {
        Some(c) => text.with(c).to_string(),
        None => text.to_string(),
    }
}

/// Like [`format`], but returns plain text when `enabled` is false.
pub fn paint(text: &str, color: SemanticColor, enabled: bool) -> String {
    if enabled {
        format(text, color)
    } else {
        text.to_string()
    }
}

/// Color is used only on a terminal and only without `NO_COLOR`.
pub fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
