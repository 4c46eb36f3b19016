//! Point-to-point sessions over TCP or an in-process link.
//!
//! A [`Server`] binds a port and accepts exactly one peer; a [`Client`]
//! dials it with a bounded timeout. Once connected, both roles speak the
//! same [`Messenger`] interface: newline-delimited messages with escaped
//! line breaks, and `f64` tables carried as one line each.
//!
//! [`Session::pair`] connects a server-role and a client-role session over
//! an in-process link instead of a socket.
//!
//! ```no_run
//! use linelink_session::{Client, Messenger, SessionConfig};
//!
//! let mut client = Client::connect("127.0.0.1", SessionConfig::default())?;
//! client.send(b"ping")?;
//! let reply = client.receive()?;
//! client.close()?;
//! # let _ = reply;
//! # Ok::<(), linelink_session::SessionError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod session;

pub use client::Client;
pub use config::{SessionConfig, DEFAULT_BIND_HOST};
pub use error::{Result, SessionError};
pub use server::Server;
pub use session::{MessageReceiver, MessageSender, Messenger, Role, Session, SessionState};
