/// Errors that can occur while reading or writing lines.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A line exceeds the configured line buffer size.
    #[error("line too long ({size} bytes, max {max})")]
    LineTooLong { size: usize, max: usize },

    /// An I/O error occurred while reading or writing lines.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream and no further data is buffered.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// True when the error is the clean end-of-stream signal rather than a failure.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, FrameError::ConnectionClosed)
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

pub(crate) fn transport_to_frame_error(err: linelink_transport::TransportError) -> FrameError {
    use linelink_transport::TransportError;

    match err {
        TransportError::Io(io) | TransportError::Accept(io) => FrameError::Io(io),
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Resolve { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
