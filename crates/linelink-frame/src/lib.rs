//! Newline-terminated message framing with embedded-newline escaping.
//!
//! This is the core value-add layer of linelink. Every message travels as
//! exactly one line:
//! - `\r\n` inside the payload is sent as the literal text `\r\n`
//! - any other `\n` is sent as the literal text `\n`
//! - a single raw `\n` terminates the line
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
#[cfg(feature = "async")]
pub mod line_codec;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_line, encode_line, escape, escape_into, unescape, FrameConfig, DEFAULT_MAX_LINE,
    TERMINATOR,
};
pub use error::{FrameError, Result};
#[cfg(feature = "async")]
pub use line_codec::LineCodec;
pub use reader::LineReader;
pub use writer::LineWriter;
