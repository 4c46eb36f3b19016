use std::net::SocketAddr;

use bytes::Bytes;
use linelink_transport::TcpEndpoint;
use tracing::info;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::session::{MessageReceiver, MessageSender, Messenger, Role, Session, SessionState};

/// Client role: dials a server once, bounded by the configured timeout.
#[derive(Debug)]
pub struct Client {
    config: SessionConfig,
    session: Session,
}

impl Client {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            session: Session::new(Role::Client),
        }
    }

    /// Create a client and connect to `host` on the configured port.
    pub fn connect(host: &str, config: SessionConfig) -> Result<Self> {
        let mut client = Self::new(config);
        client.establish(host)?;
        Ok(client)
    }

    /// Connect to `host` on the configured port.
    ///
    /// A refused or timed-out attempt fails without retrying and leaves
    /// the client closed.
    pub fn establish(&mut self, host: &str) -> Result<SocketAddr> {
        let addr = self.config.peer_addr(host);
        let timeout = self.config.connect_timeout;
        self.session.establish_with(&self.config, move || {
            info!(%addr, ?timeout, "connecting to server");
            let stream = TcpEndpoint::connect_timeout(&addr, timeout)?;
            let peer = stream.peer_addr()?;
            Ok((stream, peer))
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.session.peer_addr()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn into_split(self) -> Result<(MessageSender, MessageReceiver)> {
        self.session.into_split()
    }
}

impl Messenger for Client {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.session.send(payload)
    }

    fn receive(&mut self) -> Result<Bytes> {
        self.session.receive()
    }

    fn close(&mut self) -> Result<()> {
        self.session.close()
    }
}
