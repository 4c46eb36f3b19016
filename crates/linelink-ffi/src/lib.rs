//! linelink-ffi: C-ABI exports for linelink sessions.
//!
//! Every handle is an opaque pointer to either a server or a client. Calls
//! return an [`LlResult`] code; details of the last failure on the calling
//! thread are available from [`ll_last_error`].

mod args;
mod error;
mod message;
mod session;
mod types;

use std::panic::AssertUnwindSafe;

pub use message::ll_message_free;
pub use session::{
    ll_client_new, ll_close, ll_free, ll_receive, ll_receive_table, ll_send, ll_send_table,
    ll_server_accept, ll_server_bind, ll_server_new, ll_server_port,
};
pub use types::{
    LlMessage, LlResult, LlSessionHandle, LL_ERR_BUFFER_TOO_SMALL, LL_ERR_CLOSED,
    LL_ERR_CONNECT_REFUSED, LL_ERR_CONNECT_TIMEOUT, LL_ERR_DISCONNECTED, LL_ERR_FRAME,
    LL_ERR_INTERNAL, LL_ERR_INVALID_ARGUMENT, LL_ERR_INVALID_TABLE, LL_ERR_NOT_CONNECTED,
    LL_ERR_TRANSPORT, LL_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

#[no_mangle]
pub extern "C" fn ll_init() -> LlResult {
    ffi_boundary(LlResult::Internal, || {
        error::clear_error_state();
        LlResult::Ok
    })
}

#[no_mangle]
pub extern "C" fn ll_cleanup() {
    ffi_boundary((), || {
        error::clear_error_state();
    });
}

#[no_mangle]
pub extern "C" fn ll_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}
