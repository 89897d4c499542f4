//! Embedding and checking a CRC-16 inside a payload.
//!
//! The sender zeroes a two-byte slot, runs the CRC over the whole buffer
//! including that slot, then stores the result in it. The receiver repeats
//! the computation with the slot read as zero. The CRC is stored
//! little-endian.

use crate::crc::crc16_update;
use crate::error::{FrameError, Result};

/// Size of an embedded CRC-16.
pub const CRC_LEN: usize = 2;

/// Write a CRC-16 into the two bytes following `buf[..data_len]`.
///
/// Returns the new payload length, `data_len + 2`.
pub fn append_crc16(buf: &mut [u8], data_len: usize) -> Result<usize> {
    let total = data_len.saturating_add(CRC_LEN);
    if total > buf.len() {
        return Err(FrameError::BufferTooSmall {
            needed: total,
            available: buf.len(),
        });
    }

    buf[data_len..total].fill(0);
    let crc = buf[..total]
        .iter()
        .fold(0u16, |crc, &b| crc16_update(crc, b));
    buf[data_len..total].copy_from_slice(&crc.to_le_bytes());

    Ok(total)
}

/// Check the CRC-16 stored at `buf[crc_pos..crc_pos + 2]`.
///
/// The CRC is recomputed over the entire buffer with the CRC slot read as
/// zero, so data after the slot is covered too. Returns the CRC on a match.
/// A CRC of zero is a valid result here.
pub fn verify_crc16(buf: &[u8], crc_pos: usize) -> Result<u16> {
    if buf.is_empty() || crc_pos.saturating_add(CRC_LEN) > buf.len() {
        return Err(FrameError::InvalidCrcOffset {
            offset: crc_pos,
            len: buf.len(),
        });
    }

    let slot = crc_pos..crc_pos + CRC_LEN;
    let received = u16::from_le_bytes([buf[crc_pos], buf[crc_pos + 1]]);
    let computed = buf.iter().enumerate().fold(0u16, |crc, (i, &b)| {
        crc16_update(crc, if slot.contains(&i) { 0 } else { b })
    });

    if computed != received {
        return Err(FrameError::CrcMismatch { received, computed });
    }
    Ok(computed)
}

/// Single-number view of [`verify_crc16`]: the CRC on success, 0 otherwise.
///
/// This is the status value older firmware reports. A payload whose true
/// CRC is zero is indistinguishable from a failure in this form.
pub fn crc16_status(buf: &[u8], crc_pos: usize) -> u16 {
    verify_crc16(buf, crc_pos).unwrap_or(0)
}
