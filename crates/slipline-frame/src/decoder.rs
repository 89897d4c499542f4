use slipline_transport::CharTransport;
use tracing::trace;

use crate::consts::{END, ESC, ESC_END, ESC_ESC, MAX_FRAME_LEN};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Normal,
    Escaped,
}

/// Translate the character following an `ESC`.
///
/// Unknown escapes pass through unchanged.
pub(crate) fn unescape(byte: u8) -> u8 {
    match byte {
        ESC_END => END,
        ESC_ESC => ESC,
        other => other,
    }
}

/// Receive one frame from `transport` into `dst`, returning its length.
///
/// Blocks (polling the transport) until either an `END` closes a non-empty
/// frame, or the destination is full. Leading and repeated `END`s are
/// skipped rather than reported as empty frames.
///
/// The capacity is `dst.len()`, capped at [`MAX_FRAME_LEN`]. When the
/// returned length equals the capacity the frame may have been cut short;
/// the rest of it will show up as the next frame. A zero capacity returns
/// `Ok(0)` without touching the transport.
pub fn recv_frame<T>(transport: &mut T, dst: &mut [u8]) -> Result<usize>
where
    T: CharTransport + ?Sized,
{
    let capacity = dst.len().min(MAX_FRAME_LEN);
    if capacity == 0 {
        return Ok(0);
    }

    let mut mode = Mode::Normal;
    let mut len = 0usize;

    loop {
        let Some(c) = transport.try_recv()? else {
            std::hint::spin_loop();
            continue;
        };

        let byte = match (mode, c) {
            (Mode::Normal, END) => {
                if len > 0 {
                    trace!(len, "frame received");
                    return Ok(len);
                }
                continue;
            }
            (Mode::Normal, ESC) => {
                mode = Mode::Escaped;
                continue;
            }
            (Mode::Normal, c) => c,
            (Mode::Escaped, c) => {
                mode = Mode::Normal;
                unescape(c)
            }
        };

        dst[len] = byte;
        len += 1;

        if len >= capacity {
            trace!(len, "destination full, frame truncated");
            return Ok(len);
        }
    }
}
