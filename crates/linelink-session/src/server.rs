use std::fmt;
use std::net::SocketAddr;

use bytes::Bytes;
use linelink_transport::TcpEndpoint;
use tracing::info;

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::session::{MessageReceiver, MessageSender, Messenger, Role, Session, SessionState};

/// Server role: binds a port and accepts exactly one peer.
///
/// The listening socket is released as soon as the first peer is accepted,
/// so later connection attempts are refused by the OS.
pub struct Server {
    listener: Option<TcpEndpoint>,
    local_addr: SocketAddr,
    config: SessionConfig,
    session: Session,
}

impl Server {
    /// Bind the configured host and port without accepting yet.
    ///
    /// Port 0 asks the OS for an ephemeral port; see [`Server::local_addr`].
    pub fn bind(config: SessionConfig) -> Result<Self> {
        let listener = TcpEndpoint::bind(&config.bind_addr())?;
        let local_addr = listener.local_addr();
        info!(addr = %local_addr, "server bound");
        Ok(Self {
            listener: Some(listener),
            local_addr,
            config,
            session: Session::new(Role::Server),
        })
    }

    /// Bind and block until one peer connects.
    pub fn listen(config: SessionConfig) -> Result<Self> {
        let mut server = Self::bind(config)?;
        server.establish()?;
        Ok(server)
    }

    /// Block until a peer connects, then stop listening.
    ///
    /// Returns the peer's address. Fails with
    /// [`SessionError::AlreadyEstablished`] if called more than once.
    pub fn establish(&mut self) -> Result<SocketAddr> {
        let listener = self.listener.take();
        let local_addr = self.local_addr;
        self.session.establish_with(&self.config, move || {
            let listener = listener.ok_or(SessionError::Closed)?;
            info!(addr = %local_addr, "waiting for peer");
            let accepted = listener.accept()?;
            Ok(accepted)
        })
    }

    /// Address the server is (or was) listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// True while the listening socket is still open.
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
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

impl Messenger for Server {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.session.send(payload)
    }

    fn receive(&mut self) -> Result<Bytes> {
        self.session.receive()
    }

    fn close(&mut self) -> Result<()> {
        self.listener = None;
        self.session.close()
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr)
            .field("listening", &self.is_listening())
            .field("session", &self.session)
            .finish()
    }
}
