use slipline_transport::TransportError;

/// Errors that can occur during frame encoding/decoding and CRC handling.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the maximum frame size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The frame is too short to hold what the configuration expects.
    #[error("frame too short ({size} bytes, min {min})")]
    FrameTooShort { size: usize, min: usize },

    /// The destination has no room for the CRC trailer.
    #[error("buffer too small ({available} bytes, need {needed})")]
    BufferTooSmall { needed: usize, available: usize },

    /// The CRC field does not lie inside the buffer.
    #[error("invalid crc offset {offset} for {len} byte buffer")]
    InvalidCrcOffset { offset: usize, len: usize },

    /// The embedded CRC does not match the recomputed one.
    #[error("crc mismatch (received {received:#06x}, computed {computed:#06x})")]
    CrcMismatch { received: u16, computed: u16 },

    /// The character transport failed or closed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An I/O error occurred on a byte stream (codec use).
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True when the transport reported that no more input will arrive.
    pub fn is_closed(&self) -> bool {
        matches!(self, FrameError::Transport(TransportError::Closed))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
