use std::fmt;
use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use linelink_frame::{LineReader, LineWriter};
use linelink_table::Table;
use linelink_transport::LinkStream;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};

/// Which side of the connection a session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Server,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Server => "server",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a session.
///
/// `Unconnected -> Connecting -> Connected -> Closed`. A failed establish
/// moves straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Unconnected,
    Connecting,
    Connected,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unconnected => "unconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Operations shared by both roles once connected.
///
/// Table operations are provided on top of `send`/`receive`: a table is one
/// line whose payload is its wire encoding.
pub trait Messenger {
    /// Send one message as a single line.
    fn send(&mut self, payload: &[u8]) -> Result<()>;

    /// Block until the next complete line arrives and return it unescaped.
    fn receive(&mut self) -> Result<Bytes>;

    /// Close the connection. Later operations fail with [`SessionError::Closed`].
    fn close(&mut self) -> Result<()>;

    fn send_table(&mut self, table: &Table) -> Result<()> {
        let payload = linelink_table::serialize(table)?;
        self.send(&payload)
    }

    fn receive_table(&mut self) -> Result<Table> {
        let payload = self.receive()?;
        Ok(linelink_table::deserialize(&payload)?)
    }
}

struct Connection {
    reader: LineReader<LinkStream>,
    writer: LineWriter<LinkStream>,
    /// `None` for in-process links.
    peer_addr: Option<SocketAddr>,
}

impl Connection {
    fn open(
        stream: LinkStream,
        peer_addr: Option<SocketAddr>,
        config: &SessionConfig,
    ) -> Result<Self> {
        stream.set_nodelay(config.nodelay)?;
        let reader_stream = stream.try_clone()?;
        let frame_config = config.frame_config();
        let reader = LineReader::with_config_link(reader_stream, frame_config.clone())?;
        let writer = LineWriter::with_config_link(stream, frame_config)?;
        Ok(Self {
            reader,
            writer,
            peer_addr,
        })
    }
}

/// One end of an established (or not yet established) connection.
///
/// Owned by [`crate::Server`] or [`crate::Client`]; use
/// [`Session::into_split`] to drive sending and receiving from separate
/// threads.
pub struct Session {
    role: Role,
    state: SessionState,
    conn: Option<Connection>,
}

impl Session {
    pub(crate) fn new(role: Role) -> Self {
        Self {
            role,
            state: SessionState::Unconnected,
            conn: None,
        }
    }

    /// Connect a server-role and a client-role session over an in-process
    /// link, with the default configuration.
    ///
    /// Both sessions start `Connected` and behave like a TCP pair: same
    /// framing, same table format, same close semantics.
    pub fn pair() -> Result<(Session, Session)> {
        Self::pair_with_config(&SessionConfig::default())
    }

    /// Like [`Session::pair`], applying the line limit and timeouts from
    /// `config`. Address and connect settings are ignored.
    pub fn pair_with_config(config: &SessionConfig) -> Result<(Session, Session)> {
        let (server_end, client_end) = LinkStream::memory_pair();
        let server = Self::attached(Role::Server, server_end, config)?;
        let client = Self::attached(Role::Client, client_end, config)?;
        Ok((server, client))
    }

    fn attached(role: Role, stream: LinkStream, config: &SessionConfig) -> Result<Self> {
        let transport = stream.transport_name();
        let conn = Connection::open(stream, None, config)?;
        info!(%role, transport, "session connected");
        Ok(Self {
            role,
            state: SessionState::Connected,
            conn: Some(conn),
        })
    }

    /// Run `connect` and attach the stream it yields.
    ///
    /// Only an `Unconnected` session may establish. Any failure leaves the
    /// session `Closed`.
    pub(crate) fn establish_with<F>(
        &mut self,
        config: &SessionConfig,
        connect: F,
    ) -> Result<SocketAddr>
    where
        F: FnOnce() -> Result<(LinkStream, SocketAddr)>,
    {
        if self.state != SessionState::Unconnected {
            return Err(SessionError::AlreadyEstablished(self.state));
        }
        self.state = SessionState::Connecting;

        let opened = connect().and_then(|(stream, peer)| {
            let conn = Connection::open(stream, Some(peer), config)?;
            Ok((conn, peer))
        });
        match opened {
            Ok((conn, peer)) => {
                self.conn = Some(conn);
                self.state = SessionState::Connected;
                info!(role = %self.role, %peer, "session connected");
                Ok(peer)
            }
            Err(err) => {
                self.state = SessionState::Closed;
                warn!(role = %self.role, error = %err, "session establish failed");
                Err(err)
            }
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Remote address once connected over TCP.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.conn.as_ref().and_then(|conn| conn.peer_addr)
    }

    /// Split a connected session into independently owned halves.
    ///
    /// Both halves share the socket; dropping both closes it.
    pub fn into_split(mut self) -> Result<(MessageSender, MessageReceiver)> {
        self.connection()?;
        let conn = self.conn.take().ok_or(SessionError::Closed)?;
        Ok((
            MessageSender {
                role: self.role,
                writer: conn.writer,
            },
            MessageReceiver {
                role: self.role,
                reader: conn.reader,
            },
        ))
    }

    fn connection(&mut self) -> Result<&mut Connection> {
        match self.state {
            SessionState::Connected => self.conn.as_mut().ok_or(SessionError::Closed),
            SessionState::Closed => Err(SessionError::Closed),
            state => Err(SessionError::NotConnected(state)),
        }
    }
}

impl Messenger for Session {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        let role = self.role;
        let conn = self.connection()?;
        conn.writer.send(payload)?;
        debug!(%role, size = payload.len(), "sent message");
        Ok(())
    }

    fn receive(&mut self) -> Result<Bytes> {
        let role = self.role;
        let conn = self.connection()?;
        let payload = conn.reader.read_line()?;
        debug!(%role, size = payload.len(), "received message");
        Ok(payload)
    }

    fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }
        self.state = SessionState::Closed;

        match self.conn.take() {
            Some(conn) => {
                info!(role = %self.role, peer = ?conn.peer_addr, "closing session");
                if let Err(err) = conn.writer.get_ref().shutdown() {
                    warn!(role = %self.role, error = %err, "socket shutdown failed");
                    return Err(err.into());
                }
            }
            None => debug!(role = %self.role, "closing session that never connected"),
        }
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("peer_addr", &self.peer_addr())
            .finish()
    }
}

/// Sending half of a split session.
pub struct MessageSender {
    role: Role,
    writer: LineWriter<LinkStream>,
}

impl MessageSender {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.writer.send(payload)?;
        debug!(role = %self.role, size = payload.len(), "sent message");
        Ok(())
    }

    pub fn send_table(&mut self, table: &Table) -> Result<()> {
        let payload = linelink_table::serialize(table)?;
        self.send(&payload)
    }

    /// Shut down both directions of the shared connection.
    ///
    /// The receiving half observes end of stream on its next read.
    pub fn shutdown(&self) -> Result<()> {
        self.writer.get_ref().shutdown()?;
        Ok(())
    }
}

impl fmt::Debug for MessageSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageSender")
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Receiving half of a split session.
pub struct MessageReceiver {
    role: Role,
    reader: LineReader<LinkStream>,
}

impl MessageReceiver {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn receive(&mut self) -> Result<Bytes> {
        let payload = self.reader.read_line()?;
        debug!(role = %self.role, size = payload.len(), "received message");
        Ok(payload)
    }

    pub fn receive_table(&mut self) -> Result<Table> {
        let payload = self.receive()?;
        Ok(linelink_table::deserialize(&payload)?)
    }

    /// Receive on a background thread, delivering each result on a channel.
    ///
    /// The thread stops after the first error (which is delivered) or once
    /// the channel's receiving end is dropped.
    pub fn spawn(mut self) -> (JoinHandle<()>, mpsc::Receiver<Result<Bytes>>) {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || loop {
            let result = self.receive();
            let stop = result.is_err();
            if tx.send(result).is_err() || stop {
                debug!(role = %self.role, "receiver thread exiting");
                break;
            }
        });
        (handle, rx)
    }
}

impl fmt::Debug for MessageReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageReceiver")
            .field("role", &self.role)
            .field("buffered", &self.reader.buffered())
            .finish()
    }
}
