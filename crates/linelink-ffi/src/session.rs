use std::os::raw::c_char;

use linelink_session::{Client, Server, SessionConfig};
use linelink_table::Table;

use crate::args;
use crate::error;
use crate::message::write_message_out;
use crate::types::{LlMessage, LlResult, LlSessionHandle, SessionHandle};

fn with_session_mut<T>(
    handle: LlSessionHandle,
    on_error: T,
    f: impl FnOnce(&mut SessionHandle) -> T,
) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("session handle cannot be null");
        return on_error;
    }

    let session = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *(handle as *mut SessionHandle) }
    };

    f(session)
}

fn with_server_mut(handle: LlSessionHandle, f: impl FnOnce(&mut Server) -> LlResult) -> LlResult {
    with_session_mut(handle, LlResult::InvalidArgument, |session| match session {
        SessionHandle::Server(server) => f(server),
        SessionHandle::Client(_) => error::set_invalid_argument("handle is not a server"),
    })
}

fn into_handle(session: SessionHandle) -> LlSessionHandle {
    Box::into_raw(Box::new(session)) as LlSessionHandle
}

/// Bind a server on `port` without waiting for a peer.
///
/// Pass `0` to let the OS choose; read it back with `ll_server_port`.
#[no_mangle]
pub extern "C" fn ll_server_bind(port: u16) -> LlSessionHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();

        match Server::bind(SessionConfig::default().with_port(port)) {
            Ok(server) => into_handle(SessionHandle::Server(server)),
            Err(err) => {
                let _ = error::map_session_error(&err);
                std::ptr::null_mut()
            }
        }
    })
}

/// Report the port a server handle is bound to.
///
/// # Safety
/// `server` must be a valid server handle and `out_port` a non-null writable pointer.
#[no_mangle]
pub unsafe extern "C" fn ll_server_port(server: LlSessionHandle, out_port: *mut u16) -> LlResult {
    crate::ffi_boundary(LlResult::Internal, || {
        error::clear_error_state();

        if out_port.is_null() {
            return error::set_invalid_argument("out_port cannot be null");
        }

        with_server_mut(server, |server| {
            // SAFETY: Pointer was checked for null above.
            unsafe { args::write_out(out_port, server.local_addr().port()) };
            LlResult::Ok
        })
    })
}

/// Block until one peer connects to a bound server.
///
/// # Safety
/// `server` must be a valid server handle returned by `ll_server_bind`.
#[no_mangle]
pub unsafe extern "C" fn ll_server_accept(server: LlSessionHandle) -> LlResult {
    crate::ffi_boundary(LlResult::Internal, || {
        error::clear_error_state();

        with_server_mut(server, |server| match server.establish() {
            Ok(_) => LlResult::Ok,
            Err(err) => error::map_session_error(&err),
        })
    })
}

/// Bind a server on `port` and block until one peer connects.
#[no_mangle]
pub extern "C" fn ll_server_new(port: u16) -> LlSessionHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();

        match Server::listen(SessionConfig::default().with_port(port)) {
            Ok(server) => into_handle(SessionHandle::Server(server)),
            Err(err) => {
                let _ = error::map_session_error(&err);
                std::ptr::null_mut()
            }
        }
    })
}

/// Connect to a server at `host:port`, giving up after the default timeout.
///
/// # Safety
/// `host` must be a non-null pointer to a valid UTF-8, NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn ll_client_new(host: *const c_char, port: u16) -> LlSessionHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();

        let host = {
            // SAFETY: We validate null and UTF-8 in helper.
            match unsafe { args::required_str_arg(host, "host") } {
                Some(v) => v,
                None => return std::ptr::null_mut(),
            }
        };

        match Client::connect(host, SessionConfig::default().with_port(port)) {
            Ok(client) => into_handle(SessionHandle::Client(client)),
            Err(err) => {
                let _ = error::map_session_error(&err);
                std::ptr::null_mut()
            }
        }
    })
}

/// Send `len` bytes as one message.
///
/// # Safety
/// `session` must be a valid session handle. If `len > 0`, `data` must be non-null and
/// readable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn ll_send(session: LlSessionHandle, data: *const u8, len: usize) -> LlResult {
    crate::ffi_boundary(LlResult::Internal, || {
        error::clear_error_state();

        let payload = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { args::bytes_arg(data, len, "data") } {
                Some(v) => v,
                None => return LlResult::InvalidArgument,
            }
        };

        with_session_mut(session, LlResult::InvalidArgument, |session| {
            match session.messenger().send(payload) {
                Ok(()) => LlResult::Ok,
                Err(err) => error::map_session_error(&err),
            }
        })
    })
}

/// Block until the next message arrives.
///
/// # Safety
/// `session` must be a valid session handle and `out_message` a valid writable pointer.
/// If `out_message->data` already holds a payload from this library, it is freed first.
#[no_mangle]
pub unsafe extern "C" fn ll_receive(session: LlSessionHandle, out_message: *mut LlMessage) -> LlResult {
    crate::ffi_boundary(LlResult::Internal, || {
        error::clear_error_state();

        with_session_mut(session, LlResult::InvalidArgument, |session| {
            match session.messenger().receive() {
                Ok(payload) => write_message_out(out_message, &payload),
                Err(err) => error::map_session_error(&err),
            }
        })
    })
}

/// Send a `rows` x `cols` table stored row-major in `values`.
///
/// # Safety
/// `session` must be a valid session handle. If `rows * cols > 0`, `values` must be non-null
/// and readable for `rows * cols` doubles.
#[no_mangle]
pub unsafe extern "C" fn ll_send_table(
    session: LlSessionHandle,
    values: *const f64,
    rows: usize,
    cols: usize,
) -> LlResult {
    crate::ffi_boundary(LlResult::Internal, || {
        error::clear_error_state();

        let cells = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { args::cells_arg(values, rows, cols) } {
                Some(v) => v,
                None => return LlResult::InvalidArgument,
            }
        };

        let table = match Table::from_row_major(cells, cols) {
            Ok(table) => table,
            Err(err) => {
                error::set_error_message(err.to_string());
                return LlResult::InvalidTable;
            }
        };

        with_session_mut(session, LlResult::InvalidArgument, |session| {
            match session.messenger().send_table(&table) {
                Ok(()) => LlResult::Ok,
                Err(err) => error::map_session_error(&err),
            }
        })
    })
}

/// Receive a table into a caller buffer of `capacity` doubles, row-major.
///
/// The table's dimensions are always written to `out_rows`/`out_cols`. If it
/// does not fit, `LL_ERR_BUFFER_TOO_SMALL` is returned and the table is
/// discarded.
///
/// # Safety
/// `session` must be a valid session handle. `out_rows` and `out_cols` must be non-null
/// writable pointers. If `capacity > 0`, `buffer` must be non-null and writable for
/// `capacity` doubles.
#[no_mangle]
pub unsafe extern "C" fn ll_receive_table(
    session: LlSessionHandle,
    buffer: *mut f64,
    capacity: usize,
    out_rows: *mut usize,
    out_cols: *mut usize,
) -> LlResult {
    crate::ffi_boundary(LlResult::Internal, || {
        error::clear_error_state();

        if out_rows.is_null() || out_cols.is_null() {
            return error::set_invalid_argument("out_rows and out_cols cannot be null");
        }
        if capacity > 0 && buffer.is_null() {
            return error::set_invalid_argument("buffer cannot be null when capacity > 0");
        }

        with_session_mut(session, LlResult::InvalidArgument, |session| {
            let table = match session.messenger().receive_table() {
                Ok(table) => table,
                Err(err) => return error::map_session_error(&err),
            };

            let (rows, cols) = table.dims();
            // SAFETY: Pointers were checked for null above.
            unsafe {
                args::write_out(out_rows, rows);
                args::write_out(out_cols, cols);
            }

            let cells = table.to_row_major();
            if cells.len() > capacity {
                error::set_error_message(format!(
                    "table has {} cells but buffer holds {capacity}",
                    cells.len()
                ));
                return LlResult::BufferTooSmall;
            }

            // SAFETY: `buffer` is writable for `capacity >= cells.len()` doubles.
            unsafe { std::ptr::copy_nonoverlapping(cells.as_ptr(), buffer, cells.len()) };
            LlResult::Ok
        })
    })
}

/// Close the connection. The handle stays valid until `ll_free`.
///
/// # Safety
/// `session` must be a valid session handle.
#[no_mangle]
pub unsafe extern "C" fn ll_close(session: LlSessionHandle) -> LlResult {
    crate::ffi_boundary(LlResult::Internal, || {
        error::clear_error_state();

        with_session_mut(session, LlResult::InvalidArgument, |session| {
            match session.messenger().close() {
                Ok(()) => LlResult::Ok,
                Err(err) => error::map_session_error(&err),
            }
        })
    })
}

/// Free a session handle, closing its connection if still open.
///
/// # Safety
/// `session` must be null or a handle returned by one of the `ll_*_new` or `ll_server_bind`
/// functions.
#[no_mangle]
pub unsafe extern "C" fn ll_free(session: LlSessionHandle) {
    crate::ffi_boundary((), || {
        if session.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by this library.
        unsafe {
            drop(Box::from_raw(session as *mut SessionHandle));
        }
    });
}

#[cfg(test)]
mod tests {
    use std::ffi::{CStr, CString};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    fn last_error() -> String {
        // SAFETY: `ll_last_error` returns a pointer to a thread-local CString.
        unsafe { CStr::from_ptr(crate::ll_last_error()) }
            .to_string_lossy()
            .into_owned()
    }

    struct SendHandle(LlSessionHandle);

    // SAFETY: the handle is used by one thread at a time in these tests.
    unsafe impl Send for SendHandle {}

    fn connected_pair() -> (LlSessionHandle, LlSessionHandle) {
        let server = ll_server_bind(0);
        assert!(!server.is_null(), "bind failed: {}", last_error());

        let mut port = 0u16;
        // SAFETY: `server` is a live handle and `port` is writable.
        assert_eq!(unsafe { ll_server_port(server, &mut port) }, LlResult::Ok);

        let server = SendHandle(server);
        let acceptor = thread::spawn(move || {
            let server = server;
            // SAFETY: `server` is a live handle owned by this thread until joined.
            let result = unsafe { ll_server_accept(server.0) };
            (server, result)
        });

        let host = CString::new("127.0.0.1").expect("host has no NUL");
        // SAFETY: `host` is a valid C string.
        let client = unsafe { ll_client_new(host.as_ptr(), port) };
        assert!(!client.is_null(), "connect failed: {}", last_error());

        let (server, result) = acceptor.join().expect("acceptor thread should finish");
        assert_eq!(result, LlResult::Ok);
        (server.0, client)
    }

    #[test]
    fn message_roundtrip_through_handles() {
        let (server, client) = connected_pair();
        let payload = b"Hello,\n\tPing!";

        // SAFETY: handles are live for the duration of the test.
        unsafe {
            assert_eq!(
                ll_send(client, payload.as_ptr(), payload.len()),
                LlResult::Ok
            );

            let mut message = LlMessage::default();
            assert_eq!(ll_receive(server, &mut message), LlResult::Ok);
            let received = std::slice::from_raw_parts(message.data, message.len);
            assert_eq!(received, payload);
            crate::ll_message_free(&mut message);

            assert_eq!(ll_close(client), LlResult::Ok);
            assert_eq!(ll_receive(server, &mut message), LlResult::Disconnected);
            assert_eq!(ll_send(client, payload.as_ptr(), payload.len()), LlResult::Closed);

            ll_free(client);
            ll_free(server);
        }
    }

    #[test]
    fn table_roundtrip_and_small_buffer() {
        let (server, client) = connected_pair();
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

        // SAFETY: handles are live for the duration of the test.
        unsafe {
            assert_eq!(ll_send_table(server, values.as_ptr(), 2, 3), LlResult::Ok);
            let mut buffer = [0.0f64; 6];
            let (mut rows, mut cols) = (0usize, 0usize);
            assert_eq!(
                ll_receive_table(client, buffer.as_mut_ptr(), buffer.len(), &mut rows, &mut cols),
                LlResult::Ok
            );
            assert_eq!((rows, cols), (2, 3));
            assert_eq!(buffer, values);

            assert_eq!(ll_send_table(server, values.as_ptr(), 3, 2), LlResult::Ok);
            let mut small = [0.0f64; 4];
            assert_eq!(
                ll_receive_table(client, small.as_mut_ptr(), small.len(), &mut rows, &mut cols),
                LlResult::BufferTooSmall
            );
            assert_eq!((rows, cols), (3, 2));

            assert_eq!(
                ll_send_table(server, values.as_ptr(), 0, 3),
                LlResult::InvalidTable
            );

            ll_free(client);
            ll_free(server);
        }
    }

    #[test]
    fn client_without_listener_reports_refused() {
        let port = {
            let probe = TcpListener::bind("127.0.0.1:0").expect("probe should bind");
            probe.local_addr().expect("probe should have addr").port()
        };
        let host = CString::new("127.0.0.1").expect("host has no NUL");

        // SAFETY: `host` is a valid C string.
        let client = unsafe { ll_client_new(host.as_ptr(), port) };
        assert!(client.is_null());
        assert!(!last_error().is_empty());
    }

    #[test]
    fn null_handles_are_rejected() {
        // SAFETY: null handles are checked before use.
        unsafe {
            assert_eq!(ll_send(std::ptr::null_mut(), std::ptr::null(), 0), LlResult::InvalidArgument);
            assert_eq!(ll_close(std::ptr::null_mut()), LlResult::InvalidArgument);
            ll_free(std::ptr::null_mut());
        }
        assert!(last_error().contains("null"));
    }

    #[test]
    fn server_calls_reject_client_handles() {
        let (server, client) = connected_pair();
        let mut port = 0u16;

        // SAFETY: handles are live for the duration of the test.
        unsafe {
            assert_eq!(ll_server_port(client, &mut port), LlResult::InvalidArgument);
            assert_eq!(ll_server_accept(server), LlResult::InvalidArgument);
            ll_free(client);
            ll_free(server);
        }
    }
}
