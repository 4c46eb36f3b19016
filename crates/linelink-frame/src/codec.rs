use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Every frame on the wire ends with a single line feed.
pub const TERMINATOR: u8 = b'\n';

/// Literal text that stands in for an embedded `\r\n`.
pub const ESCAPED_CRLF: &[u8] = b"\\r\\n";

/// Literal text that stands in for an embedded `\n`.
pub const ESCAPED_LF: &[u8] = b"\\n";

/// Default line buffer size: 16 MiB of escaped bytes.
pub const DEFAULT_MAX_LINE: usize = 16 * 1024 * 1024;

/// Escape `payload` so it contains no raw line feed, appending to `dst`.
///
/// `\r\n` is replaced as a unit by the four bytes `\r\n`; any remaining `\n`
/// becomes the two bytes `\n`. A lone `\r` is copied unchanged.
pub fn escape_into(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(payload.len());
    let mut i = 0;
    while i < payload.len() {
        match payload[i] {
            b'\r' if payload.get(i + 1) == Some(&b'\n') => {
                dst.put_slice(ESCAPED_CRLF);
                i += 2;
            }
            b'\n' => {
                dst.put_slice(ESCAPED_LF);
                i += 1;
            }
            b => {
                dst.put_u8(b);
                i += 1;
            }
        }
    }
}

/// Escape `payload` into a fresh buffer.
pub fn escape(payload: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(payload.len());
    escape_into(payload, &mut dst);
    dst.freeze()
}

/// Reverse [`escape`]: literal `\r\n` becomes CR LF, literal `\n` becomes LF.
///
/// Payloads that already carried the literal escape text come back as real
/// line breaks; the scheme cannot tell the two apart.
pub fn unescape(line: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(line.len());
    let mut i = 0;
    while i < line.len() {
        let rest = &line[i..];
        if rest.starts_with(ESCAPED_CRLF) {
            out.put_slice(b"\r\n");
            i += ESCAPED_CRLF.len();
        } else if rest.starts_with(ESCAPED_LF) {
            out.put_u8(b'\n');
            i += ESCAPED_LF.len();
        } else {
            out.put_u8(line[i]);
            i += 1;
        }
    }
    out.freeze()
}

/// Encode a payload into a complete wire line (escaped bytes + terminator).
///
/// Wire format:
/// ```text
/// ┌────────────────────────────────────┬──────┐
/// │ escaped payload (no raw 0x0A)      │ 0x0A │
/// └────────────────────────────────────┴──────┘
/// ```
pub fn encode_line(payload: &[u8], dst: &mut BytesMut, max_line_size: usize) -> Result<()> {
    let start = dst.len();
    escape_into(payload, dst);
    let size = dst.len() - start;
    if size > max_line_size {
        dst.truncate(start);
        return Err(FrameError::LineTooLong {
            size,
            max: max_line_size,
        });
    }
    dst.put_u8(TERMINATOR);
    Ok(())
}

/// Decode one line from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a terminator yet.
/// On success, consumes the line and its terminator from the buffer.
pub fn decode_line(src: &mut BytesMut, max_line_size: usize) -> Result<Option<Bytes>> {
    match src.iter().position(|&b| b == TERMINATOR) {
        Some(pos) if pos > max_line_size => Err(FrameError::LineTooLong {
            size: pos,
            max: max_line_size,
        }),
        Some(pos) => {
            let line = src.split_to(pos);
            src.advance(1);
            Ok(Some(unescape(&line)))
        }
        None if src.len() > max_line_size => Err(FrameError::LineTooLong {
            size: src.len(),
            max: max_line_size,
        }),
        None => Ok(None), // Need more data
    }
}

/// Drain whatever is left in the buffer at end of stream as a final line.
///
/// Returns `None` when nothing is buffered.
pub fn decode_trailing(src: &mut BytesMut) -> Option<Bytes> {
    if src.is_empty() {
        return None;
    }
    let line = src.split();
    Some(unescape(&line))
}

/// Configuration for the line codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum escaped line size in bytes. Default: 16 MiB.
    pub max_line_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_line_size: DEFAULT_MAX_LINE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(payload: &[u8]) -> Bytes {
        unescape(&escape(payload))
    }

    #[test]
    fn test_escape_removes_every_line_feed() {
        let cases: [&[u8]; 6] = [
            b"",
            b"ping",
            b"Hello,\n\tPing!",
            b"\n\n\n",
            b"a\r\nb\r\n\r\nc",
            b"\r\n\n\r\r\n",
        ];
        for payload in cases {
            let escaped = escape(payload);
            assert!(!escaped.contains(&TERMINATOR), "{payload:?}");
            assert_eq!(roundtrip(payload).as_ref(), payload);
        }
    }

    #[test]
    fn test_crlf_escaped_as_one_unit() {
        assert_eq!(escape(b"a\r\nb").as_ref(), b"a\\r\\nb");
        assert_eq!(escape(b"a\nb").as_ref(), b"a\\nb");
        assert_eq!(escape(b"\r\n\n").as_ref(), b"\\r\\n\\n");
    }

    #[test]
    fn test_lone_carriage_return_passes_through() {
        assert_eq!(escape(b"a\rb").as_ref(), b"a\rb");
        assert_eq!(roundtrip(b"\r\r").as_ref(), b"\r\r");
        assert_eq!(roundtrip(b"a\r").as_ref(), b"a\r");
    }

    #[test]
    fn test_literal_escape_text_is_ambiguous() {
        // Text that already spells the escape token decodes as a real line break.
        assert_eq!(roundtrip(b"a\\nb").as_ref(), b"a\nb");
        assert_eq!(roundtrip(b"a\\r\\nb").as_ref(), b"a\r\nb");
    }

    #[test]
    fn test_unescape_leaves_other_backslashes() {
        assert_eq!(unescape(b"C:\\temp\\x").as_ref(), b"C:\\temp\\x");
        assert_eq!(unescape(b"trailing\\").as_ref(), b"trailing\\");
        assert_eq!(unescape(b"\\r").as_ref(), b"\\r");
    }

    #[test]
    fn test_encode_decode_line() {
        let mut buf = BytesMut::new();
        encode_line(b"Hello,\n\tPing!", &mut buf, DEFAULT_MAX_LINE).unwrap();

        assert_eq!(buf.as_ref(), b"Hello,\\n\tPing!\n".as_ref());
        assert_eq!(buf.iter().filter(|&&b| b == TERMINATOR).count(), 1);

        let line = decode_line(&mut buf, DEFAULT_MAX_LINE).unwrap().unwrap();
        assert_eq!(line.as_ref(), b"Hello,\n\tPing!");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_line() {
        let mut buf = BytesMut::from(&b"no terminator yet"[..]);
        assert!(decode_line(&mut buf, DEFAULT_MAX_LINE).unwrap().is_none());
        assert_eq!(buf.len(), 17);
    }

    #[test]
    fn test_multiple_lines() {
        let mut buf = BytesMut::new();
        encode_line(b"first", &mut buf, DEFAULT_MAX_LINE).unwrap();
        encode_line(b"", &mut buf, DEFAULT_MAX_LINE).unwrap();
        encode_line(b"third\n", &mut buf, DEFAULT_MAX_LINE).unwrap();

        let l1 = decode_line(&mut buf, DEFAULT_MAX_LINE).unwrap().unwrap();
        let l2 = decode_line(&mut buf, DEFAULT_MAX_LINE).unwrap().unwrap();
        let l3 = decode_line(&mut buf, DEFAULT_MAX_LINE).unwrap().unwrap();

        assert_eq!(l1.as_ref(), b"first");
        assert!(l2.is_empty());
        assert_eq!(l3.as_ref(), b"third\n");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_line_too_long() {
        let mut buf = BytesMut::from(&b"keep"[..]);
        let err = encode_line(b"\n\n\n", &mut buf, 5).unwrap_err();
        assert!(matches!(err, FrameError::LineTooLong { size: 6, max: 5 }));
        assert_eq!(buf.as_ref(), b"keep");
    }

    #[test]
    fn test_decode_line_too_long() {
        let mut buf = BytesMut::from(&b"0123456789"[..]);
        let err = decode_line(&mut buf, 4).unwrap_err();
        assert!(matches!(err, FrameError::LineTooLong { size: 10, max: 4 }));

        let mut terminated = BytesMut::from(&b"0123456789\n"[..]);
        let err = decode_line(&mut terminated, 4).unwrap_err();
        assert!(matches!(err, FrameError::LineTooLong { size: 10, max: 4 }));
    }

    #[test]
    fn test_decode_trailing() {
        let mut buf = BytesMut::from(&b"tail\\nend"[..]);
        assert_eq!(decode_trailing(&mut buf).unwrap().as_ref(), b"tail\nend");
        assert!(buf.is_empty());
        assert!(decode_trailing(&mut buf).is_none());
    }
}
