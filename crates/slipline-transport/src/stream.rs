use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::CharTransport;

const DEFAULT_READ_CHUNK: usize = 8 * 1024;
const INITIAL_WRITE_CAPACITY: usize = 512;

/// A connected byte stream carrying a SLIP link; implements Read + Write.
///
/// Wraps a Unix domain socket, a TCP connection, or an already configured
/// character device (serial port, pty).
pub struct LinkStream {
    inner: LinkStreamInner,
}

enum LinkStreamInner {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
    Tcp(TcpStream),
    Device(File),
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.read(buf),
            LinkStreamInner::Tcp(stream) => stream.read(buf),
            LinkStreamInner::Device(file) => file.read(buf),
        }
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.write(buf),
            LinkStreamInner::Tcp(stream) => stream.write(buf),
            LinkStreamInner::Device(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.flush(),
            LinkStreamInner::Tcp(stream) => stream.flush(),
            LinkStreamInner::Device(file) => file.flush(),
        }
    }
}

impl LinkStream {
    #[cfg(unix)]
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: LinkStreamInner::Unix(stream),
        }
    }

    /// Connect to a listening Unix domain socket (blocking).
    #[cfg(unix)]
    pub fn connect_unix(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream =
            std::os::unix::net::UnixStream::connect(path).map_err(|e| TransportError::Connect {
                target: path.display().to_string(),
                source: e,
            })?;
        debug!(?path, "connected to unix domain socket");
        Ok(Self::from_unix(stream))
    }

    /// Connect to a TCP endpoint such as a serial-over-IP bridge (blocking).
    pub fn connect_tcp(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(|e| TransportError::Connect {
            target: addr.to_string(),
            source: e,
        })?;
        stream.set_nodelay(true)?;
        debug!(addr, "connected to tcp endpoint");
        Ok(Self {
            inner: LinkStreamInner::Tcp(stream),
        })
    }

    /// Open a character device for reading and writing.
    ///
    /// Line settings (baud rate, parity, raw mode) must already be applied.
    pub fn open_device(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| TransportError::Open {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!(?path, "opened character device");
        Ok(Self {
            inner: LinkStreamInner::Device(file),
        })
    }

    /// Set read timeout on the underlying stream.
    ///
    /// Devices ignore this; their timing is governed by the line discipline.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            LinkStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            LinkStreamInner::Device(_) => {
                debug!("read timeout not applicable to character devices");
                Ok(())
            }
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            LinkStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            LinkStreamInner::Device(_) => Ok(()),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        let inner = match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => LinkStreamInner::Unix(stream.try_clone()?),
            LinkStreamInner::Tcp(stream) => LinkStreamInner::Tcp(stream.try_clone()?),
            LinkStreamInner::Device(file) => LinkStreamInner::Device(file.try_clone()?),
        };
        Ok(Self { inner })
    }

    /// Short name of the underlying link kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(_) => "unix",
            LinkStreamInner::Tcp(_) => "tcp",
            LinkStreamInner::Device(_) => "device",
        }
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStream")
            .field("type", &self.kind())
            .finish()
    }
}

/// Character transport over any `Read + Write` byte stream.
///
/// Reads are pulled in chunks and handed out one character at a time. Sends
/// are buffered until [`CharTransport::flush`]. `Interrupted`, `WouldBlock`
/// and `TimedOut` reads count as "no character yet"; end of stream is
/// reported as [`TransportError::Closed`].
pub struct StreamTransport<S> {
    inner: S,
    rx: BytesMut,
    tx: Vec<u8>,
    chunk: usize,
}

impl<S: Read + Write> StreamTransport<S> {
    /// Wrap a stream with the default read chunk size.
    pub fn new(inner: S) -> Self {
        Self::with_read_chunk(inner, DEFAULT_READ_CHUNK)
    }

    /// Wrap a stream, reading at most `chunk` bytes per underlying read.
    pub fn with_read_chunk(inner: S, chunk: usize) -> Self {
        let chunk = chunk.max(1);
        Self {
            inner,
            rx: BytesMut::with_capacity(chunk),
            tx: Vec::with_capacity(INITIAL_WRITE_CAPACITY),
            chunk,
        }
    }

    /// Characters already read from the stream but not yet handed out.
    pub fn buffered(&self) -> usize {
        self.rx.len()
    }

    /// Sent characters waiting for the next flush.
    pub fn unflushed(&self) -> usize {
        self.tx.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the transport and return the inner stream.
    ///
    /// Unflushed sends and unread characters are dropped.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn fill(&mut self) -> Result<bool> {
        self.rx.resize(self.chunk, 0);
        let read = match self.inner.read(&mut self.rx[..]) {
            Ok(n) => n,
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
                ) =>
            {
                self.rx.clear();
                return Ok(false);
            }
            Err(err) => {
                self.rx.clear();
                return Err(TransportError::Io(err));
            }
        };
        self.rx.truncate(read);

        if read == 0 {
            return Err(TransportError::Closed);
        }
        Ok(true)
    }
}

impl<S: Read + Write> CharTransport for StreamTransport<S> {
    fn try_recv(&mut self) -> Result<Option<u8>> {
        if self.rx.is_empty() && !self.fill()? {
            return Ok(None);
        }
        Ok(Some(self.rx.get_u8()))
    }

    fn send(&mut self, byte: u8) -> Result<()> {
        self.tx.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.tx.len() {
            let err = match self.inner.write(&self.tx[offset..]) {
                Ok(0) => TransportError::Closed,
                Ok(n) => {
                    offset += n;
                    continue;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => TransportError::Io(err),
            };
            // Bytes already on the wire must not be sent again; nothing will
            // reach a closed link.
            match err {
                TransportError::Closed => self.tx.clear(),
                _ => drop(self.tx.drain(..offset)),
            }
            return Err(err);
        }
        self.tx.clear();

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<S> std::fmt::Debug for StreamTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("buffered_rx", &self.rx.len())
            .field("buffered_tx", &self.tx.len())
            .finish()
    }
}
