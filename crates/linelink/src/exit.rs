use std::fmt;
use std::io;

use linelink_frame::FrameError;
use linelink_session::SessionError;
use linelink_table::TableError;
use linelink_transport::TransportError;

// Exit code categories shared by every subcommand.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;
pub const INTERRUPTED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::AddrInUse
        | io::ErrorKind::AddrNotAvailable => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::ConnectTimeout { .. } => {
            CliError::new(TIMEOUT, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::LineTooLong { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn table_error(context: &str, err: TableError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Frame(err) => frame_error(context, err),
        SessionError::Table(err) => table_error(context, err),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn connect_failures_map_to_categories() {
        let timeout = session_error(
            "connect failed",
            SessionError::Transport(TransportError::ConnectTimeout {
                addr: "10.0.0.1:10000".to_string(),
                timeout: Duration::from_secs(10),
            }),
        );
        assert_eq!(timeout.code, TIMEOUT);
        assert!(timeout.message.starts_with("connect failed: "));

        let refused = session_error(
            "connect failed",
            SessionError::Transport(TransportError::ConnectRefused {
                addr: "127.0.0.1:1".to_string(),
            }),
        );
        assert_eq!(refused.code, TRANSPORT_ERROR);
    }

    #[test]
    fn data_errors_are_data_invalid() {
        let err = session_error("receive failed", SessionError::Table(TableError::Empty));
        assert_eq!(err.code, DATA_INVALID);

        let err = frame_error(
            "receive failed",
            FrameError::LineTooLong { size: 10, max: 4 },
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn closed_session_is_internal() {
        assert_eq!(session_error("send", SessionError::Closed).code, INTERNAL);
    }
}
