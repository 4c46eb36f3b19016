//! In-process link: two connected ends that exchange byte chunks over
//! channels instead of a socket.

use std::io::{self, ErrorKind};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

enum Chunk {
    Data(Vec<u8>),
    Eof,
}

/// One end of an in-process link. Clones share the same end.
pub(crate) struct MemoryStream {
    end: Arc<End>,
}

struct End {
    /// Chunks for the other end.
    outgoing: Mutex<Option<Sender<Chunk>>>,
    /// Wakes a reader on this end blocked in `recv` after a local shutdown.
    wake: Mutex<Option<Sender<Chunk>>>,
    incoming: Mutex<Incoming>,
    read_timeout: Mutex<Option<Duration>>,
}

struct Incoming {
    rx: Receiver<Chunk>,
    pending: Vec<u8>,
    pos: usize,
    eof: bool,
}

/// Create two connected ends.
pub(crate) fn pair() -> (MemoryStream, MemoryStream) {
    let (to_a, a_rx) = mpsc::channel();
    let (to_b, b_rx) = mpsc::channel();
    let a = End::new(to_b.clone(), to_a.clone(), a_rx);
    let b = End::new(to_a, to_b, b_rx);
    (
        MemoryStream { end: Arc::new(a) },
        MemoryStream { end: Arc::new(b) },
    )
}

impl End {
    fn new(outgoing: Sender<Chunk>, wake: Sender<Chunk>, rx: Receiver<Chunk>) -> Self {
        Self {
            outgoing: Mutex::new(Some(outgoing)),
            wake: Mutex::new(Some(wake)),
            incoming: Mutex::new(Incoming {
                rx,
                pending: Vec::new(),
                pos: 0,
                eof: false,
            }),
            read_timeout: Mutex::new(None),
        }
    }
}

impl Drop for End {
    fn drop(&mut self) {
        if let Ok(slot) = self.outgoing.get_mut() {
            if let Some(tx) = slot.take() {
                // The other end may already be gone.
                let _ = tx.send(Chunk::Eof);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> io::Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| io::Error::other("in-memory link lock poisoned"))
}

impl MemoryStream {
    pub(crate) fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let timeout = *lock(&self.end.read_timeout)?;
        let mut incoming = lock(&self.end.incoming)?;

        while incoming.pos >= incoming.pending.len() {
            if incoming.eof {
                return Ok(0);
            }
            let chunk = match timeout {
                Some(timeout) => match incoming.rx.recv_timeout(timeout) {
                    Ok(chunk) => chunk,
                    Err(RecvTimeoutError::Timeout) => {
                        return Err(io::Error::new(ErrorKind::WouldBlock, "read timed out"));
                    }
                    Err(RecvTimeoutError::Disconnected) => Chunk::Eof,
                },
                None => incoming.rx.recv().unwrap_or(Chunk::Eof),
            };
            match chunk {
                Chunk::Data(bytes) => {
                    incoming.pending = bytes;
                    incoming.pos = 0;
                }
                Chunk::Eof => incoming.eof = true,
            }
        }

        let start = incoming.pos;
        let n = buf.len().min(incoming.pending.len() - start);
        buf[..n].copy_from_slice(&incoming.pending[start..start + n]);
        incoming.pos += n;
        Ok(n)
    }

    pub(crate) fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let outgoing = lock(&self.end.outgoing)?;
        let tx = outgoing
            .as_ref()
            .ok_or_else(|| io::Error::new(ErrorKind::BrokenPipe, "link is shut down"))?;
        tx.send(Chunk::Data(buf.to_vec()))
            .map_err(|_| io::Error::new(ErrorKind::BrokenPipe, "other end is gone"))?;
        Ok(buf.len())
    }

    pub(crate) fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        *lock(&self.end.read_timeout)? = timeout;
        Ok(())
    }

    pub(crate) fn try_clone(&self) -> Self {
        Self {
            end: Arc::clone(&self.end),
        }
    }

    /// Signal end of stream to both ends. Repeated calls are no-ops.
    pub(crate) fn shutdown(&self) -> io::Result<()> {
        if let Some(tx) = lock(&self.end.outgoing)?.take() {
            let _ = tx.send(Chunk::Eof);
        }
        if let Some(tx) = lock(&self.end.wake)?.take() {
            let _ = tx.send(Chunk::Eof);
        }
        Ok(())
    }
}
