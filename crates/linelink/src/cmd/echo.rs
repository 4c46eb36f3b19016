use linelink_session::{Messenger, Server};

use crate::cmd::{install_ctrlc_handler, EchoArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: EchoArgs, format: OutputFormat) -> CliResult<i32> {
    install_ctrlc_handler()?;

    let mut server = Server::bind(args.listen.session_config())
        .map_err(|err| session_error("bind failed", err))?;
    tracing::info!(addr = %server.local_addr(), "listening");

    let peer = server
        .establish()
        .map_err(|err| session_error("accept failed", err))?;

    let echoed = echo_until_closed(&mut server, args.count, |payload| {
        print_message(payload, peer, format)
    })?;

    if let Err(err) = server.close() {
        tracing::warn!(error = %err, "close failed");
    }
    tracing::info!(messages = echoed, "session finished");
    Ok(SUCCESS)
}

/// Echo messages until the peer closes or `limit` messages have been echoed.
///
/// `on_echo` sees each payload after it has been sent back.
fn echo_until_closed<M, F>(
    session: &mut M,
    limit: Option<usize>,
    mut on_echo: F,
) -> CliResult<usize>
where
    M: Messenger,
    F: FnMut(&[u8]),
{
    let mut echoed = 0usize;
    while limit.map_or(true, |limit| echoed < limit) {
        let payload = match session.receive() {
            Ok(payload) => payload,
            Err(err) if err.is_end_of_stream() => break,
            Err(err) => return Err(session_error("receive failed", err)),
        };

        tracing::info!(size = payload.len(), "echoing message");
        session
            .send(&payload)
            .map_err(|err| session_error("echo send failed", err))?;
        on_echo(&payload);
        echoed += 1;
    }
    Ok(echoed)
}
