use std::net::SocketAddr;

use linelink_session::{Messenger, Server};

use crate::cmd::{install_ctrlc_handler, ServeArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_message, print_table, OutputFormat};

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    install_ctrlc_handler()?;

    let mut server = Server::bind(args.listen.session_config())
        .map_err(|err| session_error("bind failed", err))?;
    tracing::info!(addr = %server.local_addr(), "listening");

    let peer = server
        .establish()
        .map_err(|err| session_error("accept failed", err))?;

    let mut printed = 0usize;
    while receive_and_print(&mut server, peer, args.table, format)? {
        printed = printed.saturating_add(1);
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    if let Err(err) = server.close() {
        tracing::warn!(error = %err, "close failed");
    }
    tracing::info!(messages = printed, "session finished");
    Ok(SUCCESS)
}

/// Print the next message; `false` once the peer has closed the connection.
fn receive_and_print<M: Messenger>(
    session: &mut M,
    peer: SocketAddr,
    as_table: bool,
    format: OutputFormat,
) -> CliResult<bool> {
    let result = if as_table {
        session
            .receive_table()
            .map(|table| print_table(&table, peer, format))
    } else {
        session
            .receive()
            .map(|payload| print_message(&payload, peer, format))
    };

    match result {
        Ok(()) => Ok(true),
        Err(err) if err.is_end_of_stream() => Ok(false),
        Err(err) => Err(session_error("receive failed", err)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use bytes::Bytes;
    use linelink_frame::FrameError;
    use linelink_session::{Result, SessionError};

    use super::*;
    use crate::exit::DATA_INVALID;

    struct Scripted {
        replies: VecDeque<Result<Bytes>>,
    }

    impl Messenger for Scripted {
        fn send(&mut self, _payload: &[u8]) -> Result<()> {
            Ok(())
        }

        fn receive(&mut self) -> Result<Bytes> {
            self.replies
                .pop_front()
                .unwrap_or(Err(SessionError::Frame(FrameError::ConnectionClosed)))
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:10000".parse().unwrap()
    }

    #[test]
    fn end_of_stream_stops_cleanly() {
        let mut session = Scripted {
            replies: VecDeque::from([Ok(Bytes::from_static(b"ping"))]),
        };
        assert!(receive_and_print(&mut session, peer(), false, OutputFormat::Raw).unwrap());
        assert!(!receive_and_print(&mut session, peer(), false, OutputFormat::Raw).unwrap());
    }

    #[test]
    fn invalid_table_is_data_invalid() {
        let mut session = Scripted {
            replies: VecDeque::from([Ok(Bytes::from_static(b"{\"data\":[]}"))]),
        };
        let err = receive_and_print(&mut session, peer(), true, OutputFormat::Json)
            .expect_err("empty table should be rejected");
        assert_eq!(err.code, DATA_INVALID);
    }
}
