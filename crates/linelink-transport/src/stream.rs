use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::Result;
use crate::memory::{self, MemoryStream};

/// A connected stream implementing `Read` and `Write`.
///
/// This is the fundamental I/O type returned by transport operations. It is
/// either a TCP socket or one end of an in-process link from
/// [`LinkStream::memory_pair`]. A session clones it once so the line reader
/// and line writer each own a handle to the same connection.
pub struct LinkStream {
    inner: LinkStreamInner,
}

enum LinkStreamInner {
    Tcp(TcpStream),
    Memory(MemoryStream),
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkStreamInner::Tcp(stream) => stream.read(buf),
            LinkStreamInner::Memory(stream) => stream.read(buf),
        }
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkStreamInner::Tcp(stream) => stream.write(buf),
            LinkStreamInner::Memory(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            LinkStreamInner::Tcp(stream) => stream.flush(),
            LinkStreamInner::Memory(_) => Ok(()),
        }
    }
}

impl LinkStream {
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: LinkStreamInner::Tcp(stream),
        }
    }

    /// Create two connected in-process ends.
    ///
    /// Bytes written to one end are read from the other, in order. Shutting
    /// down either end, or dropping every handle to it, ends the other
    /// end's stream.
    pub fn memory_pair() -> (Self, Self) {
        let (a, b) = memory::pair();
        (
            Self {
                inner: LinkStreamInner::Memory(a),
            },
            Self {
                inner: LinkStreamInner::Memory(b),
            },
        )
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            LinkStreamInner::Tcp(_) => "tcp",
            LinkStreamInner::Memory(_) => "memory",
        }
    }

    /// Set read timeout on the underlying stream.
    ///
    /// A read that times out fails with `WouldBlock`.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            LinkStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            LinkStreamInner::Memory(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    ///
    /// In-process writes never block, so the timeout only applies to TCP.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            LinkStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            LinkStreamInner::Memory(_) => Ok(()),
        }
    }

    /// Disable Nagle's algorithm so short lines go out immediately.
    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        match &self.inner {
            LinkStreamInner::Tcp(stream) => stream.set_nodelay(nodelay).map_err(Into::into),
            LinkStreamInner::Memory(_) => Ok(()),
        }
    }

    /// Try to clone this stream (creates a new handle to the same connection).
    pub fn try_clone(&self) -> Result<Self> {
        let inner = match &self.inner {
            LinkStreamInner::Tcp(stream) => LinkStreamInner::Tcp(stream.try_clone()?),
            LinkStreamInner::Memory(stream) => LinkStreamInner::Memory(stream.try_clone()),
        };
        Ok(Self { inner })
    }

    /// Address of the remote endpoint.
    ///
    /// In-process links have no socket address and report `Unsupported`.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        match &self.inner {
            LinkStreamInner::Tcp(stream) => stream.peer_addr().map_err(Into::into),
            LinkStreamInner::Memory(_) => Err(no_socket_addr().into()),
        }
    }

    /// Address of the local endpoint.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        match &self.inner {
            LinkStreamInner::Tcp(stream) => stream.local_addr().map_err(Into::into),
            LinkStreamInner::Memory(_) => Err(no_socket_addr().into()),
        }
    }

    /// Shut down both halves of the connection.
    ///
    /// Affects every clone of this stream. A socket the peer already reset
    /// reports `NotConnected`, which is treated as success.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            LinkStreamInner::Tcp(stream) => match stream.shutdown(Shutdown::Both) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
                Err(err) => Err(err.into()),
            },
            LinkStreamInner::Memory(stream) => stream.shutdown().map_err(Into::into),
        }
    }
}

fn no_socket_addr() -> std::io::Error {
    std::io::Error::new(ErrorKind::Unsupported, "in-memory link has no socket address")
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dbg = f.debug_struct("LinkStream");
        dbg.field("type", &self.transport_name());
        if let Ok(addr) = self.peer_addr() {
            dbg.field("peer", &addr);
        }
        dbg.finish()
    }
}
