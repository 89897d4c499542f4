use bytes::Bytes;

use crate::checksum::CRC_LEN;
use crate::consts::MAX_FRAME_LEN;

/// A received frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The de-escaped payload (CRC trailer already stripped when enabled).
    pub payload: Bytes,
    /// The frame filled the receive buffer and may continue on the link.
    pub truncated: bool,
}

impl Frame {
    /// Create a complete (non-truncated) frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            truncated: false,
        }
    }

    /// The payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True for a zero-length payload.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Configuration for frame readers, writers and the codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest frame on the wire (payload plus CRC trailer), at most
    /// [`MAX_FRAME_LEN`]. Default: 255.
    pub max_frame_len: usize,
    /// Append a little-endian CRC-16 trailer when writing and check and
    /// strip it when reading. Default: off.
    pub crc16: bool,
}

impl FrameConfig {
    /// Frame length clamped to `1..=MAX_FRAME_LEN`, or to
    /// `CRC_LEN..=MAX_FRAME_LEN` with the CRC trailer enabled so the trailer
    /// always fits.
    pub fn effective_max_frame_len(&self) -> usize {
        let min = if self.crc16 { CRC_LEN } else { 1 };
        self.max_frame_len.clamp(min, MAX_FRAME_LEN)
    }

    /// Largest payload a writer accepts under this configuration.
    pub fn max_payload_len(&self) -> usize {
        let max = self.effective_max_frame_len();
        if self.crc16 {
            max.saturating_sub(CRC_LEN)
        } else {
            max
        }
    }

    /// Shorthand for a configuration with the CRC trailer enabled.
    pub fn with_crc16() -> Self {
        Self {
            crc16: true,
            ..Self::default()
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_len: MAX_FRAME_LEN,
            crc16: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = FrameConfig::default();
        assert_eq!(cfg.effective_max_frame_len(), 255);
        assert_eq!(cfg.max_payload_len(), 255);
        assert!(!cfg.crc16);
    }

    #[test]
    fn crc_trailer_reduces_payload_room() {
        let cfg = FrameConfig::with_crc16();
        assert_eq!(cfg.max_payload_len(), 253);
    }

    #[test]
    fn max_frame_len_is_clamped() {
        let cfg = FrameConfig {
            max_frame_len: 4096,
            ..FrameConfig::default()
        };
        assert_eq!(cfg.effective_max_frame_len(), MAX_FRAME_LEN);

        let cfg = FrameConfig {
            max_frame_len: 0,
            crc16: false,
        };
        assert_eq!(cfg.effective_max_frame_len(), 1);
        assert_eq!(cfg.max_payload_len(), 1);
    }

    #[test]
    fn crc_trailer_always_fits_the_frame() {
        for max_frame_len in [0, 1, 2] {
            let cfg = FrameConfig {
                max_frame_len,
                crc16: true,
            };
            assert_eq!(cfg.effective_max_frame_len(), CRC_LEN);
            assert_eq!(cfg.max_payload_len(), 0);
        }
    }

    #[test]
    fn frame_accessors() {
        let frame = Frame::new(&b"abc"[..]);
        assert_eq!(frame.len(), 3);
        assert!(!frame.is_empty());
        assert!(!frame.truncated);
    }
}
