//! Reserved SLIP bytes.

/// Frame boundary.
pub const END: u8 = 0xC0;

/// Escape marker.
pub const ESC: u8 = 0xDB;

/// Substitute for `END` inside a payload (follows `ESC`).
pub const ESC_END: u8 = 0xDC;

/// Substitute for `ESC` inside a payload (follows `ESC`).
pub const ESC_ESC: u8 = 0xDD;

/// Largest payload a single frame may carry; lengths are 8-bit counts.
pub const MAX_FRAME_LEN: usize = u8::MAX as usize;
