use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::warn;

use crate::checksum::{append_crc16, verify_crc16, CRC_LEN};
use crate::consts::{END, ESC, MAX_FRAME_LEN};
use crate::decoder::{unescape, Mode};
use crate::encoder::encode_into;
use crate::error::FrameError;
use crate::frame::{Frame, FrameConfig};

/// SLIP framing for `tokio_util::codec`.
///
/// Unlike [`recv_frame`](crate::recv_frame), the codec keeps the partial
/// frame and escape state between calls, since input arrives in arbitrary
/// chunks. Frames failing the CRC check (when enabled) are logged and
/// skipped rather than ending the stream.
#[derive(Debug)]
pub struct SlipCodec {
    config: FrameConfig,
    mode: Mode,
    frame: BytesMut,
}

impl SlipCodec {
    /// Codec with the default configuration (255-byte frames, no CRC).
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Codec with an explicit frame length limit and CRC setting.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            config,
            mode: Mode::Normal,
            frame: BytesMut::with_capacity(MAX_FRAME_LEN),
        }
    }

    /// Current codec configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Wrap an async byte stream into a `Framed` sink/stream of frames.
    pub fn wrap<T>(self, io: T) -> Framed<T, SlipCodec>
    where
        T: AsyncRead + AsyncWrite,
    {
        Framed::new(io, self)
    }

    fn finish(&mut self, truncated: bool) -> Option<Frame> {
        let payload = self.frame.split().freeze();
        self.mode = Mode::Normal;

        if !self.config.crc16 {
            return Some(Frame { payload, truncated });
        }

        if payload.len() < CRC_LEN {
            warn!(len = payload.len(), "dropping frame shorter than crc");
            return None;
        }
        let crc_pos = payload.len() - CRC_LEN;
        match verify_crc16(&payload, crc_pos) {
            Ok(_) => Some(Frame {
                payload: payload.slice(..crc_pos),
                truncated,
            }),
            Err(err) => {
                warn!(len = payload.len(), error = %err, "dropping frame with bad crc");
                None
            }
        }
    }
}

impl Default for SlipCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl tokio_util::codec::Decoder for SlipCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let max = self.config.effective_max_frame_len();

        while src.has_remaining() {
            let c = src.get_u8();
            let byte = match (self.mode, c) {
                (Mode::Normal, END) => {
                    if self.frame.is_empty() {
                        continue;
                    }
                    match self.finish(false) {
                        Some(frame) => return Ok(Some(frame)),
                        None => continue,
                    }
                }
                (Mode::Normal, ESC) => {
                    self.mode = Mode::Escaped;
                    continue;
                }
                (Mode::Normal, c) => c,
                (Mode::Escaped, c) => {
                    self.mode = Mode::Normal;
                    unescape(c)
                }
            };

            self.frame.put_u8(byte);
            if self.frame.len() >= max {
                if let Some(frame) = self.finish(true) {
                    return Ok(Some(frame));
                }
            }
        }

        Ok(None)
    }
}

impl tokio_util::codec::Encoder<&[u8]> for SlipCodec {
    type Error = FrameError;

    fn encode(&mut self, payload: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        let max = self.config.max_payload_len();
        if payload.len() > max {
            return Err(FrameError::FrameTooLarge {
                size: payload.len(),
                max,
            });
        }

        if !self.config.crc16 {
            return encode_into(payload, dst);
        }

        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = payload.len();
        buf[..len].copy_from_slice(payload);
        let total = append_crc16(&mut buf[..len + CRC_LEN], len)?;
        encode_into(&buf[..total], dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{Decoder, Encoder};

    use super::*;
    use crate::consts::{ESC_END, ESC_ESC};

    fn feed(codec: &mut SlipCodec, chunks: &[&[u8]]) -> Vec<Frame> {
        let mut buf = BytesMut::new();
        let mut frames = Vec::new();
        for chunk in chunks {
            buf.extend_from_slice(chunk);
            while let Some(frame) = codec.decode(&mut buf).unwrap() {
                frames.push(frame);
            }
        }
        frames
    }

    #[test]
    fn decodes_across_chunk_boundaries() {
        let mut codec = SlipCodec::new();
        let frames = feed(
            &mut codec,
            &[
                [END, 0x01, ESC].as_slice(),
                &[ESC_END, 0x02],
                &[END, END, ESC, ESC_ESC, END],
            ],
        );

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload.as_ref(), &[0x01, END, 0x02]);
        assert_eq!(frames[1].payload.as_ref(), &[ESC]);
    }

    #[test]
    fn truncates_like_the_blocking_decoder() {
        let cfg = FrameConfig {
            max_frame_len: 3,
            ..FrameConfig::default()
        };
        let mut codec = SlipCodec::with_config(cfg);
        let frames = feed(&mut codec, &[[END, 1, 2, 3, 4, 5, END].as_slice()]);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload.as_ref(), &[1, 2, 3]);
        assert!(frames[0].truncated);
        assert_eq!(frames[1].payload.as_ref(), &[4, 5]);
        assert!(!frames[1].truncated);
    }

    #[test]
    fn encode_matches_blocking_encoder() {
        let mut codec = SlipCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(&[0x01, END, ESC][..], &mut dst).unwrap();

        assert_eq!(&dst[..], &[END, 0x01, ESC, ESC_END, ESC, ESC_ESC, END]);
    }

    #[test]
    fn bad_crc_frames_are_skipped() {
        let mut codec = SlipCodec::with_config(FrameConfig::with_crc16());
        let mut wire = BytesMut::new();
        codec.encode(&b"first"[..], &mut wire).unwrap();
        // 'f' -> 'g'
        wire[1] ^= 0x01;
        codec.encode(&b"second"[..], &mut wire).unwrap();

        let frames = feed(&mut codec, &[&wire[..]]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"second");
    }

    #[test]
    fn oversized_payload_rejected() {
        let mut codec = SlipCodec::new();
        let mut dst = BytesMut::new();
        let err = codec.encode(&[0u8; 300][..], &mut dst).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { size: 300, max: 255 }));
        assert!(dst.is_empty());
    }

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (left, right) = tokio::io::duplex(64);
        let mut tx = SlipCodec::with_config(FrameConfig::with_crc16()).wrap(left);
        let mut rx = SlipCodec::with_config(FrameConfig::with_crc16()).wrap(right);

        tx.send(&b"hello"[..]).await.unwrap();
        tx.send(&[END, ESC, 0xFF][..]).await.unwrap();

        let first = rx.next().await.unwrap().unwrap();
        let second = rx.next().await.unwrap().unwrap();
        assert_eq!(first.payload.as_ref(), b"hello");
        assert_eq!(second.payload.as_ref(), &[END, ESC, 0xFF]);
    }
}
