//! Line framing shared by server and client.
//!
//! Both sides see the connection as a [`BoxedStream`] (plain TCP or TLS),
//! read it through a [`LineReader`] and write `\n`-terminated lines.

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio_util::codec::{FramedRead, LinesCodec};

/// Longest accepted line in bytes, excluding the delimiter.
///
/// A peer that sends more without a newline is treated as broken and its
/// connection is dropped.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Creates the codec used to split a stream into logical messages.
///
/// `\n` delimits messages; a trailing `\r` is stripped, so CRLF clients
/// (telnet, netcat on Windows) work unchanged.
pub fn line_codec() -> LinesCodec {
    LinesCodec::new_with_max_length(MAX_LINE_LENGTH)
}

/// Any bidirectional byte stream a relay connection can run over.
pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncStream for T {}

/// Type-erased connection stream (TCP or TLS over TCP).
pub type BoxedStream = Box<dyn AsyncStream>;

/// Line-framed read half of a connection.
pub type LineReader = FramedRead<ReadHalf<BoxedStream>, LinesCodec>;

/// Splits a stream into a line reader and its raw write half.
pub fn split_lines(stream: BoxedStream) -> (LineReader, WriteHalf<BoxedStream>) {
    let (reader, writer) = tokio::io::split(stream);
    (FramedRead::new(reader, line_codec()), writer)
}
