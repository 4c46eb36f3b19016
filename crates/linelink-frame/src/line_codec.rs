//! `tokio_util::codec` adapter for the escaped line format.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_line, decode_trailing, encode_line, DEFAULT_MAX_LINE};
use crate::error::{FrameError, Result};

/// Decodes escaped lines into payloads and encodes payloads into lines.
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_line_size: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::with_max_line_size(DEFAULT_MAX_LINE)
    }

    pub fn with_max_line_size(max_line_size: usize) -> Self {
        Self { max_line_size }
    }

    pub fn max_line_size(&self) -> usize {
        self.max_line_size
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        decode_line(src, self.max_line_size)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None => Ok(decode_trailing(src)),
        }
    }
}

impl Encoder<Bytes> for LineCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        encode_line(&item, dst, self.max_line_size)
    }
}

impl<'a> Encoder<&'a [u8]> for LineCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a [u8], dst: &mut BytesMut) -> Result<()> {
        encode_line(item, dst, self.max_line_size)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (client, server) = tokio::io::duplex(64);
        let mut sink = FramedWrite::new(client, LineCodec::new());
        let mut stream = FramedRead::new(server, LineCodec::new());

        let writer = tokio::spawn(async move {
            sink.send(Bytes::from_static(b"ping")).await.unwrap();
            sink.send(Bytes::from_static(b"Hello,\n\tPing!")).await.unwrap();
            sink.send(Bytes::from_static(b"a\r\nb")).await.unwrap();
        });

        assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), b"ping");
        assert_eq!(
            stream.next().await.unwrap().unwrap().as_ref(),
            b"Hello,\n\tPing!"
        );
        assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), b"a\r\nb");

        writer.await.unwrap();
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn decode_eof_returns_unterminated_tail() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"tail\\nend"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        let line = codec.decode_eof(&mut buf).unwrap().unwrap();
        assert_eq!(line.as_ref(), b"tail\nend");
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn encode_slice_matches_blocking_writer_format() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(&b"x\ny"[..], &mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"x\\ny\n");
    }

    #[test]
    fn oversized_line_rejected() {
        let mut codec = LineCodec::with_max_line_size(3);
        let mut buf = BytesMut::from(&b"abcdef"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(FrameError::LineTooLong { max: 3, .. })
        ));
        assert_eq!(codec.max_line_size(), 3);
    }
}
