//! Stream transport for linelink: TCP plus an in-process link.
//!
//! This is the lowest layer of linelink. It binds the server's listening
//! endpoint, dials the client side with a bounded connect timeout, and hands
//! out the [`LinkStream`] everything else builds on. [`LinkStream::memory_pair`]
//! gives the same stream type without a socket.

pub mod error;
mod memory;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::LinkStream;
pub use tcp::{join_host_port, TcpEndpoint, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
