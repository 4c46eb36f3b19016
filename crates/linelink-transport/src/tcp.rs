use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::LinkStream;

/// Well-known port both roles agree on.
pub const DEFAULT_PORT: u16 = 10000;

/// Upper bound on how long a client waits for the server to answer.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP listening endpoint.
///
/// Provides bind/accept over IPv4 or IPv6 addresses, and the client-side
/// connect helpers that produce a [`LinkStream`].
pub struct TcpEndpoint {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpEndpoint {
    /// Bind and listen on `addr` (`host:port`; port `0` picks an ephemeral port).
    pub fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        info!(%local_addr, "listening on tcp");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<(LinkStream, SocketAddr)> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok((LinkStream::from_tcp(stream), peer))
    }

    /// Connect to a listening endpoint without a timeout (blocking).
    pub fn connect(addr: &str) -> Result<LinkStream> {
        let stream = TcpStream::connect(addr).map_err(|e| classify_connect_error(addr, e, None))?;
        debug!(addr, "connected");
        Ok(LinkStream::from_tcp(stream))
    }

    /// Connect to `addr`, giving up once `timeout` has elapsed.
    ///
    /// Every resolved address is tried in order against a single overall
    /// deadline. The error reported is the one from the last address tried.
    pub fn connect_timeout(addr: &str, timeout: Duration) -> Result<LinkStream> {
        let candidates: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|e| TransportError::Resolve {
                addr: addr.to_string(),
                source: e,
            })?
            .collect();

        if candidates.is_empty() {
            return Err(TransportError::Resolve {
                addr: addr.to_string(),
                source: std::io::Error::new(ErrorKind::InvalidInput, "no addresses resolved"),
            });
        }

        let deadline = Instant::now() + timeout;
        let mut last_err = None;

        for candidate in candidates {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match TcpStream::connect_timeout(&candidate, remaining) {
                Ok(stream) => {
                    debug!(addr, %candidate, "connected");
                    return Ok(LinkStream::from_tcp(stream));
                }
                Err(err) => {
                    debug!(%candidate, error = %err, "connect attempt failed");
                    last_err = Some(classify_connect_error(addr, err, Some(timeout)));
                }
            }
        }

        Err(last_err.unwrap_or(TransportError::ConnectTimeout {
            addr: addr.to_string(),
            timeout,
        }))
    }

    /// The address this endpoint is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Format `host` and `port` as a connectable address, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

fn classify_connect_error(
    addr: &str,
    err: std::io::Error,
    timeout: Option<Duration>,
) -> TransportError {
    match err.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::ConnectTimeout {
            addr: addr.to_string(),
            timeout: timeout.unwrap_or_default(),
        },
        ErrorKind::ConnectionRefused => TransportError::ConnectRefused {
            addr: addr.to_string(),
        },
        _ => TransportError::Connect {
            addr: addr.to_string(),
            source: err,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_bind_accept_connect() {
        let listener = TcpEndpoint::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().to_string();

        let handle = std::thread::spawn(move || {
            let mut client = TcpEndpoint::connect(&addr).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let (mut server, peer) = listener.accept().unwrap();
        assert!(peer.ip().is_loopback());
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn test_connect_timeout_succeeds_against_listener() {
        let listener = TcpEndpoint::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().to_string();

        let stream = TcpEndpoint::connect_timeout(&addr, Duration::from_secs(2)).unwrap();
        let (accepted, _) = listener.accept().unwrap();

        assert_eq!(
            stream.local_addr().unwrap(),
            accepted.peer_addr().unwrap()
        );
    }

    #[test]
    fn test_connect_refused_when_nothing_listens() {
        let port = {
            let probe = TcpEndpoint::bind("127.0.0.1:0").unwrap();
            probe.local_addr().port()
        };

        let started = Instant::now();
        let result = TcpEndpoint::connect_timeout(
            &join_host_port("127.0.0.1", port),
            Duration::from_secs(5),
        );

        assert!(matches!(result, Err(TransportError::ConnectRefused { .. })));
        assert!(result.unwrap_err().is_unreachable());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_timed_out_connect_is_classified_as_timeout() {
        let timeout = Duration::from_millis(750);
        for kind in [ErrorKind::TimedOut, ErrorKind::WouldBlock] {
            let err = classify_connect_error("10.255.255.1:10000", kind.into(), Some(timeout));
            assert!(
                matches!(
                    &err,
                    TransportError::ConnectTimeout { addr, timeout: t }
                        if addr.as_str() == "10.255.255.1:10000" && *t == timeout
                ),
                "{kind:?} gave {err:?}"
            );
            assert!(err.is_unreachable());
        }
    }

    #[test]
    fn test_other_connect_errors_keep_their_source() {
        let err = classify_connect_error(
            "127.0.0.1:1",
            ErrorKind::PermissionDenied.into(),
            Some(Duration::from_secs(1)),
        );
        assert!(matches!(
            err,
            TransportError::Connect { ref source, .. } if source.kind() == ErrorKind::PermissionDenied
        ));
        assert!(!err.is_unreachable());
    }

    #[test]
    fn test_exhausted_deadline_reports_timeout() {
        let result = TcpEndpoint::connect_timeout("127.0.0.1:1", Duration::ZERO);

        match result {
            Err(err @ TransportError::ConnectTimeout { .. }) => {
                assert!(err.is_unreachable());
                assert!(err.to_string().contains("127.0.0.1:1"));
            }
            other => panic!("expected connect timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_bind_rejects_port_in_use() {
        let first = TcpEndpoint::bind("127.0.0.1:0").unwrap();
        let result = TcpEndpoint::bind(&first.local_addr().to_string());
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }

    #[test]
    fn test_unresolvable_address() {
        let result = TcpEndpoint::connect_timeout("missing-port", Duration::from_secs(1));
        assert!(matches!(result, Err(TransportError::Resolve { .. })));
    }

    #[test]
    fn test_join_host_port() {
        assert_eq!(join_host_port("127.0.0.1", 10000), "127.0.0.1:10000");
        assert_eq!(join_host_port("localhost", 80), "localhost:80");
        assert_eq!(join_host_port("::1", 10000), "[::1]:10000");
        assert_eq!(join_host_port("[::1]", 10000), "[::1]:10000");
    }

    #[test]
    fn test_shutdown_ends_peer_reads() {
        let listener = TcpEndpoint::bind("127.0.0.1:0").unwrap();
        let client = TcpEndpoint::connect(&listener.local_addr().to_string()).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        client.shutdown().unwrap();

        let mut buf = [0u8; 1];
        assert_eq!(server.read(&mut buf).unwrap(), 0);
    }
}
