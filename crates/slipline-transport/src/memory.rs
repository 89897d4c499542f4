use std::collections::VecDeque;

use crate::error::{Result, TransportError};
use crate::traits::CharTransport;

/// In-memory character transport.
///
/// Received characters come from a queue filled by the caller; sent
/// characters are appended to a log that can be inspected afterwards. Gaps
/// can be queued to simulate polls where no character is available yet.
///
/// Once the receive queue is drained, `try_recv` reports
/// [`TransportError::Closed`] so a decoder waiting on it terminates.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    rx: VecDeque<Option<u8>>,
    tx: Vec<u8>,
    flushes: usize,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport whose receive queue holds `input`.
    pub fn with_input(input: impl AsRef<[u8]>) -> Self {
        let mut transport = Self::new();
        transport.push_input(input);
        transport
    }

    /// Queue more characters for reception.
    pub fn push_input(&mut self, input: impl AsRef<[u8]>) {
        self.rx.extend(input.as_ref().iter().copied().map(Some));
    }

    /// Queue `polls` consecutive "no character yet" results.
    pub fn push_gap(&mut self, polls: usize) {
        self.rx.extend(std::iter::repeat_n(None, polls));
    }

    /// Number of queued receive entries (characters and gaps).
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Everything sent so far.
    pub fn sent(&self) -> &[u8] {
        &self.tx
    }

    /// Take the sent log, leaving it empty.
    pub fn take_sent(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }

    /// How many times `flush` was called.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Move everything sent so far into the receive queue (loopback).
    pub fn loopback(&mut self) {
        let sent = self.take_sent();
        self.push_input(sent);
    }
}

impl CharTransport for MemoryTransport {
    fn try_recv(&mut self) -> Result<Option<u8>> {
        match self.rx.pop_front() {
            Some(entry) => Ok(entry),
            None => Err(TransportError::Closed),
        }
    }

    fn send(&mut self, byte: u8) -> Result<()> {
        self.tx.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
