use bytes::Bytes;
use slipline_transport::CharTransport;
use tracing::{debug, warn};

use crate::checksum::{verify_crc16, CRC_LEN};
use crate::consts::MAX_FRAME_LEN;
use crate::decoder::recv_frame;
use crate::error::{FrameError, Result};
use crate::frame::{Frame, FrameConfig};

/// Reads complete frames from any [`CharTransport`].
///
/// Each call decodes into an internal buffer sized for the largest frame
/// and hands back an owned [`Frame`].
pub struct FrameReader<T> {
    inner: T,
    buf: [u8; MAX_FRAME_LEN],
    config: FrameConfig,
}

impl<T: CharTransport> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: [0; MAX_FRAME_LEN],
            config,
        }
    }

    /// Read the next frame (blocking).
    ///
    /// `Frame::truncated` is set when the frame filled `max_frame_len`. With
    /// the CRC trailer enabled the last two bytes are checked and removed.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let max = self.config.effective_max_frame_len();
        let len = recv_frame(&mut self.inner, &mut self.buf[..max])?;
        let truncated = len == max;
        if truncated {
            debug!(len, "frame reached max_frame_len, treating as truncated");
        }

        let mut payload = &self.buf[..len];
        if self.config.crc16 {
            if len < CRC_LEN {
                return Err(FrameError::FrameTooShort {
                    size: len,
                    min: CRC_LEN,
                });
            }
            let crc_pos = len - CRC_LEN;
            verify_crc16(payload, crc_pos).inspect_err(|err| {
                warn!(len, truncated, error = %err, "dropping frame with bad crc");
            })?;
            payload = &payload[..crc_pos];
        }

        Ok(Frame {
            payload: Bytes::copy_from_slice(payload),
            truncated,
        })
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the frame length limit for subsequent reads.
    pub fn set_max_frame_len(&mut self, max_frame_len: usize) {
        self.config.max_frame_len = max_frame_len;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
