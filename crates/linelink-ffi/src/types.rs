use std::ffi::c_void;

use linelink_session::{Client, Messenger, Server};

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlResult {
    Ok = 0,
    InvalidArgument = 1,
    TransportError = 2,
    FrameError = 3,
    ConnectTimeout = 4,
    ConnectRefused = 5,
    Disconnected = 6,
    Closed = 7,
    NotConnected = 8,
    InvalidTable = 9,
    BufferTooSmall = 10,
    Internal = 99,
}

#[allow(dead_code)]
pub const LL_OK: LlResult = LlResult::Ok;
#[allow(dead_code)]
pub const LL_ERR_INVALID_ARGUMENT: LlResult = LlResult::InvalidArgument;
#[allow(dead_code)]
pub const LL_ERR_TRANSPORT: LlResult = LlResult::TransportError;
#[allow(dead_code)]
pub const LL_ERR_FRAME: LlResult = LlResult::FrameError;
#[allow(dead_code)]
pub const LL_ERR_CONNECT_TIMEOUT: LlResult = LlResult::ConnectTimeout;
#[allow(dead_code)]
pub const LL_ERR_CONNECT_REFUSED: LlResult = LlResult::ConnectRefused;
#[allow(dead_code)]
pub const LL_ERR_DISCONNECTED: LlResult = LlResult::Disconnected;
#[allow(dead_code)]
pub const LL_ERR_CLOSED: LlResult = LlResult::Closed;
#[allow(dead_code)]
pub const LL_ERR_NOT_CONNECTED: LlResult = LlResult::NotConnected;
#[allow(dead_code)]
pub const LL_ERR_INVALID_TABLE: LlResult = LlResult::InvalidTable;
#[allow(dead_code)]
pub const LL_ERR_BUFFER_TOO_SMALL: LlResult = LlResult::BufferTooSmall;
#[allow(dead_code)]
pub const LL_ERR_INTERNAL: LlResult = LlResult::Internal;

/// A received message. `data` is owned by the library; release it with
/// `ll_message_free`.
#[repr(C)]
#[derive(Debug)]
pub struct LlMessage {
    pub data: *mut u8,
    pub len: usize,
}

impl Default for LlMessage {
    fn default() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
        }
    }
}

pub type LlSessionHandle = *mut c_void;

pub(crate) enum SessionHandle {
    Server(Server),
    Client(Client),
}

impl SessionHandle {
    pub(crate) fn messenger(&mut self) -> &mut dyn Messenger {
        match self {
            SessionHandle::Server(server) => server,
            SessionHandle::Client(client) => client,
        }
    }
}
