use bytes::{BufMut, BytesMut};
use slipline_transport::CharTransport;
use tracing::trace;

use crate::consts::{END, ESC, ESC_END, ESC_ESC, MAX_FRAME_LEN};
use crate::error::{FrameError, Result};

/// The one or two wire bytes that stand for `byte` inside a frame.
fn escape(byte: u8) -> ([u8; 2], usize) {
    match byte {
        END => ([ESC, ESC_END], 2),
        ESC => ([ESC, ESC_ESC], 2),
        other => ([other, 0], 1),
    }
}

fn check_len(src: &[u8]) -> Result<()> {
    if src.len() > MAX_FRAME_LEN {
        return Err(FrameError::FrameTooLarge {
            size: src.len(),
            max: MAX_FRAME_LEN,
        });
    }
    Ok(())
}

/// Send `src` as one SLIP frame and return the payload length.
///
/// The frame opens with an `END` so the receiver drops any half-received
/// garbage, and closes with another `END`. The transport is flushed once
/// after the closing `END`.
pub fn send_frame<T>(transport: &mut T, src: &[u8]) -> Result<usize>
where
    T: CharTransport + ?Sized,
{
    check_len(src)?;

    transport.send(END)?;
    for &byte in src {
        let (bytes, n) = escape(byte);
        for &b in &bytes[..n] {
            transport.send(b)?;
        }
    }
    transport.send(END)?;
    transport.flush()?;

    trace!(len = src.len(), "frame sent");
    Ok(src.len())
}

/// Number of wire bytes `src` occupies once framed.
pub fn encoded_len(src: &[u8]) -> usize {
    2 + src
        .iter()
        .map(|&b| if b == END || b == ESC { 2 } else { 1 })
        .sum::<usize>()
}

/// Append the framed form of `src` to `dst`.
///
/// Produces exactly the bytes [`send_frame`] would put on the link.
pub fn encode_into(src: &[u8], dst: &mut BytesMut) -> Result<()> {
    check_len(src)?;

    dst.reserve(encoded_len(src));
    dst.put_u8(END);
    for &byte in src {
        let (bytes, n) = escape(byte);
        dst.put_slice(&bytes[..n]);
    }
    dst.put_u8(END);
    Ok(())
}

#[cfg(test)]
mod tests {
    use slipline_transport::MemoryTransport;

    use super::*;

    fn sent(src: &[u8]) -> Vec<u8> {
        let mut transport = MemoryTransport::new();
        let n = send_frame(&mut transport, src).unwrap();
        assert_eq!(n, src.len());
        transport.take_sent()
    }

    #[test]
    fn empty_frame() {
        assert_eq!(sent(&[]), [0xC0, 0xC0]);
    }

    #[test]
    fn plain_bytes() {
        assert_eq!(sent(&[0x01, 0x02, 0x03]), [0xC0, 0x01, 0x02, 0x03, 0xC0]);
    }

    #[test]
    fn escapes_end() {
        assert_eq!(
            sent(&[0x01, END, 0x03]),
            [0xC0, 0x01, ESC, ESC_END, 0x03, 0xC0]
        );
    }

    #[test]
    fn escapes_esc() {
        assert_eq!(
            sent(&[0x01, ESC, 0x03]),
            [0xC0, 0x01, ESC, ESC_ESC, 0x03, 0xC0]
        );
    }

    #[test]
    fn substitute_bytes_are_not_escaped() {
        assert_eq!(
            sent(&[ESC_END, ESC_ESC]),
            [0xC0, ESC_END, ESC_ESC, 0xC0]
        );
    }

    #[test]
    fn flushes_once_per_frame() {
        let mut transport = MemoryTransport::new();
        send_frame(&mut transport, b"ab").unwrap();
        send_frame(&mut transport, b"cd").unwrap();
        assert_eq!(transport.flush_count(), 2);
    }

    #[test]
    fn rejects_oversized_frame() {
        let mut transport = MemoryTransport::new();
        let payload = vec![0u8; MAX_FRAME_LEN + 1];
        let err = send_frame(&mut transport, &payload).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { size: 256, max: 255 }));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn max_sized_frame_is_accepted() {
        let payload = vec![END; MAX_FRAME_LEN];
        let wire = sent(&payload);
        assert_eq!(wire.len(), 2 + 2 * MAX_FRAME_LEN);
    }

    #[test]
    fn buffer_encoding_matches_transport_encoding() {
        let payload = [0x00, END, 0x7F, ESC, ESC_END, 0xFF];
        let mut buf = BytesMut::new();
        encode_into(&payload, &mut buf).unwrap();

        assert_eq!(&buf[..], sent(&payload).as_slice());
        assert_eq!(buf.len(), encoded_len(&payload));
    }

    #[test]
    fn end_only_at_frame_edges() {
        let payload: Vec<u8> = (0..=u8::MAX).take(MAX_FRAME_LEN).collect();
        let wire = sent(&payload);

        assert_eq!(wire.first(), Some(&END));
        assert_eq!(wire.last(), Some(&END));
        assert!(!wire[1..wire.len() - 1].contains(&END));
    }
}
