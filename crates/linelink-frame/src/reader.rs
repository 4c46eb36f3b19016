use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use linelink_transport::LinkStream;
use tracing::trace;

use crate::codec::{decode_line, decode_trailing, FrameConfig};
use crate::error::{transport_to_frame_error, FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete, unescaped lines from any `Read` stream.
///
/// Handles partial reads internally, so callers always get whole messages.
pub struct LineReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    eof: bool,
}

impl<T: Read> LineReader<T> {
    /// Create a new line reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new line reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            eof: false,
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// If the peer closes after an unterminated line, that line is returned
    /// as the final message. Once nothing is left, returns
    /// `Err(FrameError::ConnectionClosed)`.
    pub fn read_line(&mut self) -> Result<Bytes> {
        loop {
            if let Some(line) = decode_line(&mut self.buf, self.config.max_line_size)? {
                trace!(size = line.len(), "read line");
                return Ok(line);
            }

            if self.eof {
                return match decode_trailing(&mut self.buf) {
                    Some(line) => {
                        trace!(size = line.len(), "read unterminated final line");
                        Ok(line)
                    }
                    None => Err(FrameError::ConnectionClosed),
                };
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                self.eof = true;
                continue;
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Number of bytes received but not yet returned as a line.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current line reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl LineReader<LinkStream> {
    /// Create a line reader for `LinkStream` and apply read timeout from config.
    pub fn with_config_link(inner: LinkStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}
