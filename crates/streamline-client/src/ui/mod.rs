//! Terminal presentation: colors, banner and line rendering.

pub mod banner;
pub mod render;
pub mod theme;

pub use banner::render_banner;
pub use render::{render_line, timestamp, Printer};
pub use theme::{color_enabled, format, paint, SemanticColor};
