//! Point-to-point messaging over TCP with newline framing.
//!
//! linelink connects exactly one server and one client. Messages are byte
//! strings sent as single lines with embedded line breaks escaped, and
//! rectangular `f64` tables travel losslessly as one line each.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP bind, accept and connect with a bounded timeout
//! - [`frame`]: Line escaping, buffered line reader and writer
//! - [`table`]: Validated tables and their wire encoding
//! - [`session`]: Server and client roles sharing the `Messenger` interface

/// Re-export transport types.
pub mod transport {
    pub use linelink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use linelink_frame::*;
}

/// Re-export table types.
pub mod table {
    pub use linelink_table::*;
}

/// Re-export session types.
pub mod session {
    pub use linelink_session::*;
}

pub use linelink_session::{Client, Messenger, Server, SessionConfig, SessionError};
pub use linelink_table::Table;
