//! CRC-16 with the reflected 0xA001 polynomial and a zero initial value.
//!
//! Bit-exact with avr-libc's `_crc16_update` (CRC-16/ARC), which is what
//! the firmware on the other end of the line computes.

const POLY: u16 = 0xA001;

/// Fold one byte into a running CRC.
pub fn crc16_update(crc: u16, byte: u8) -> u16 {
    let mut crc = crc ^ u16::from(byte);
    for _ in 0..8 {
        if crc & 1 != 0 {
            crc = (crc >> 1) ^ POLY;
        } else {
            crc >>= 1;
        }
    }
    crc
}

/// CRC of a whole slice, starting from zero.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0, |crc, &b| crc16_update(crc, b))
}
