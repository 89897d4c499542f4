use crate::error::Result;

/// A link that moves one character at a time.
///
/// `try_recv` may block or return immediately; `Ok(None)` means "no character
/// yet" and callers are expected to poll again. `Err(TransportError::Closed)`
/// means nothing further will ever arrive.
///
/// Sends may be buffered by the implementation until [`flush`](Self::flush).
pub trait CharTransport {
    /// Receive one character if one is available.
    fn try_recv(&mut self) -> Result<Option<u8>>;

    /// Send one character.
    fn send(&mut self, byte: u8) -> Result<()>;

    /// Push any buffered characters out to the link.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: CharTransport + ?Sized> CharTransport for &mut T {
    fn try_recv(&mut self) -> Result<Option<u8>> {
        (**self).try_recv()
    }

    fn send(&mut self, byte: u8) -> Result<()> {
        (**self).send(byte)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<T: CharTransport + ?Sized> CharTransport for Box<T> {
    fn try_recv(&mut self) -> Result<Option<u8>> {
        (**self).try_recv()
    }

    fn send(&mut self, byte: u8) -> Result<()> {
        (**self).send(byte)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
