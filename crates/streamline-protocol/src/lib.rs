//! StreamLine Protocol - Wire protocol for the chat relay
//!
//! The protocol is plain UTF-8 text, one message per `\n`-terminated line,
//! in both directions. This crate owns the literal strings exchanged during
//! admission, the announcement formats relayed in steady state, the line
//! codec both sides frame the stream with, and the PEM loading both sides
//! use for TLS.
//!
//! No presentation (color, timestamps) ever appears on the wire.

pub mod framing;
pub mod message;
pub mod pem;

pub use framing::{
    line_codec, split_lines, AsyncStream, BoxedStream, LineReader, MAX_LINE_LENGTH,
};
pub use message::{Announcement, Rejection, ServerLine};
pub use message::{NICK_REQUEST, PASSWORD_ACCEPTED, PASSWORD_PROMPT};
pub use pem::{load_certificates, load_private_key, PemError};
