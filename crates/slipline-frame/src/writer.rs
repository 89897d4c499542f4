use slipline_transport::CharTransport;

use crate::checksum::{append_crc16, CRC_LEN};
use crate::consts::MAX_FRAME_LEN;
use crate::encoder::send_frame;
use crate::error::{FrameError, Result};
use crate::frame::{Frame, FrameConfig};

/// Writes complete frames to any [`CharTransport`].
pub struct FrameWriter<T> {
    inner: T,
    buf: [u8; MAX_FRAME_LEN],
    config: FrameConfig,
}

impl<T: CharTransport> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: [0; MAX_FRAME_LEN],
            config,
        }
    }

    /// Write a frame's payload (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.payload.as_ref())
    }

    /// Frame and send a payload, adding the CRC trailer when configured.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        let max = self.config.max_payload_len();
        if payload.len() > max {
            return Err(FrameError::FrameTooLarge {
                size: payload.len(),
                max,
            });
        }

        if !self.config.crc16 {
            send_frame(&mut self.inner, payload)?;
            return Ok(());
        }

        let len = payload.len();
        self.buf[..len].copy_from_slice(payload);
        let total = append_crc16(&mut self.buf[..len + CRC_LEN], len)?;
        send_frame(&mut self.inner, &self.buf[..total])?;
        Ok(())
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the frame length limit for subsequent writes.
    pub fn set_max_frame_len(&mut self, max_frame_len: usize) {
        self.config.max_frame_len = max_frame_len;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
