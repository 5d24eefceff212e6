//! Startup banner.

use super::theme::{paint, SemanticColor};

const BANNER: [&str; 5] = [
    r" ___ _                      _    _          ",
    r"/ __| |_ _ _ ___ __ _ _ __ | |  (_)_ _  ___ ",
    r"\__ \  _| '_/ -_) _` | '  \| |__| | ' \/ -_)",
    r"|___/\__|_| \___\__,_|_|_|_|____|_|_||_\___|",
    r"         - Made by L1avZh",
];

/// Line colors, cycled.
const CYCLE: [SemanticColor; 5] = [
    SemanticColor::Info,
    SemanticColor::Success,
    SemanticColor::Warning,
    SemanticColor::Error,
    SemanticColor::Accent,
];

/// The banner, one color per line, followed by a blank line.
pub fn render_banner(colored: bool) -> String {
    let mut out = String::new();
    for (line, color) in BANNER.iter().zip(CYCLE.iter().cycle()) {
        out.push_str(&paint(line, *color, colored));
        out.push('\n');
    }
    out.push('\n');
    out
}
