use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use linelink_session::SessionError;
use linelink_transport::TransportError;

use crate::types::LlResult;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::default();
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let sanitized = message.into().replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized).unwrap_or_default();
    });
}

pub(crate) fn set_invalid_argument(message: impl Into<String>) -> LlResult {
    set_error_message(message);
    LlResult::InvalidArgument
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn map_session_error(err: &SessionError) -> LlResult {
    set_error_message(err.to_string());
    match err {
        SessionError::Transport(TransportError::ConnectTimeout { .. }) => LlResult::ConnectTimeout,
        SessionError::Transport(TransportError::ConnectRefused { .. }) => LlResult::ConnectRefused,
        SessionError::Transport(_) => LlResult::TransportError,
        SessionError::Frame(frame) if frame.is_end_of_stream() => LlResult::Disconnected,
        SessionError::Frame(_) => LlResult::FrameError,
        SessionError::Table(_) => LlResult::InvalidTable,
        SessionError::Closed => LlResult::Closed,
        SessionError::NotConnected(_) => LlResult::NotConnected,
        SessionError::AlreadyEstablished(_) => LlResult::InvalidArgument,
    }
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use linelink_session::SessionState;

    use super::*;

    fn last_error() -> String {
        // SAFETY: the pointer refers to this thread's LAST_ERROR value.
        unsafe { CStr::from_ptr(last_error_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn interior_nul_is_replaced() {
        set_error_message("bad\0input");
        assert_eq!(last_error(), "bad?input");
        clear_error_state();
        assert!(last_error().is_empty());
    }

    #[test]
    fn session_errors_map_to_result_codes() {
        let refused = SessionError::Transport(TransportError::ConnectRefused {
            addr: "127.0.0.1:1".to_string(),
        });
        assert_eq!(map_session_error(&refused), LlResult::ConnectRefused);
        assert!(last_error().contains("127.0.0.1:1"));

        let eos = SessionError::Frame(linelink_frame::FrameError::ConnectionClosed);
        assert_eq!(map_session_error(&eos), LlResult::Disconnected);

        assert_eq!(map_session_error(&SessionError::Closed), LlResult::Closed);
        assert_eq!(
            map_session_error(&SessionError::NotConnected(SessionState::Unconnected)),
            LlResult::NotConnected
        );
        assert_eq!(
            map_session_error(&SessionError::Table(linelink_table::TableError::Empty)),
            LlResult::InvalidTable
        );
    }
}
