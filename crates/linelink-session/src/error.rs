use crate::session::SessionState;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error (bind, accept, connect).
    #[error("transport error: {0}")]
    Transport(#[from] linelink_transport::TransportError),

    /// Line-level error (read, write, end of stream).
    #[error("frame error: {0}")]
    Frame(#[from] linelink_frame::FrameError),

    /// Table validation or decoding error.
    #[error("table error: {0}")]
    Table(#[from] linelink_table::TableError),

    /// The session was closed; no further operations are possible.
    #[error("session is closed")]
    Closed,

    /// The operation needs an established connection.
    #[error("session is not connected (state: {0})")]
    NotConnected(SessionState),

    /// `establish` was called on a role that already left `Unconnected`.
    #[error("session already established (state: {0})")]
    AlreadyEstablished(SessionState),
}

impl SessionError {
    /// True when the peer closed the connection cleanly.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, SessionError::Frame(err) if err.is_end_of_stream())
    }

    /// True when the local side closed the session.
    pub fn is_closed(&self) -> bool {
        matches!(self, SessionError::Closed)
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use linelink_frame::FrameError;
    use linelink_transport::TransportError;

    use super::*;

    #[test]
    fn closed_is_distinct_from_end_of_stream() {
        let local = SessionError::Closed;
        assert!(local.is_closed());
        assert!(!local.is_end_of_stream());

        let remote = SessionError::from(FrameError::ConnectionClosed);
        assert!(remote.is_end_of_stream());
        assert!(!remote.is_closed());
    }

    #[test]
    fn wrapped_errors_keep_their_message() {
        let err = SessionError::from(TransportError::ConnectRefused {
            addr: "127.0.0.1:10000".to_string(),
        });
        assert!(!err.is_closed());
        assert_eq!(
            err.to_string(),
            "transport error: connection to 127.0.0.1:10000 refused"
        );
        assert_eq!(
            SessionError::NotConnected(SessionState::Unconnected).to_string(),
            "session is not connected (state: unconnected)"
        );
    }
}
