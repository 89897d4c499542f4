//! SLIP framing with CRC-16 integrity over byte links.
//!
//! slipline frames byte payloads with SLIP (RFC 1055) byte stuffing and can
//! protect them with an embedded CRC-16, over serial devices, Unix sockets,
//! TCP, or an in-memory link.
//!
//! # Crate Structure
//!
//! - [`transport`]: the per-byte [`CharTransport`](transport::CharTransport)
//!   seam and its stream, socket and memory implementations
//! - [`frame`]: the SLIP decoder and encoder, CRC-16 helpers, frame
//!   reader/writer, and the `tokio_util` codec (behind `async` feature)

/// Re-export transport types.
pub mod transport {
    pub use slipline_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use slipline_frame::*;
}
