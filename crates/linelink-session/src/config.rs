use std::time::Duration;

use linelink_frame::{FrameConfig, DEFAULT_MAX_LINE};
use linelink_transport::{join_host_port, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};

/// Host the server role binds when none is given.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Settings shared by both session roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Interface the server binds.
    pub bind_host: String,
    /// Port the server listens on and the client dials.
    pub port: u16,
    /// Client-side bound on connection establishment.
    pub connect_timeout: Duration,
    /// Optional read timeout on the established connection. `None` blocks forever.
    pub read_timeout: Option<Duration>,
    /// Optional write timeout on the established connection.
    pub write_timeout: Option<Duration>,
    /// Maximum escaped line size accepted or produced.
    pub max_line_size: usize,
    /// Disable Nagle's algorithm on the established connection.
    pub nodelay: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: None,
            write_timeout: None,
            max_line_size: DEFAULT_MAX_LINE,
            nodelay: true,
        }
    }
}

impl SessionConfig {
    pub fn with_bind_host(mut self, host: impl Into<String>) -> Self {
        self.bind_host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_max_line_size(mut self, max_line_size: usize) -> Self {
        self.max_line_size = max_line_size;
        self
    }

    /// Address the server role binds.
    pub fn bind_addr(&self) -> String {
        join_host_port(&self.bind_host, self.port)
    }

    /// Address the client role dials for `host`.
    pub fn peer_addr(&self, host: &str) -> String {
        join_host_port(host, self.port)
    }

    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_line_size: self.max_line_size,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
        }
    }
}
