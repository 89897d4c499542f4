//! SLIP (RFC 1055) framing with CRC-16 integrity helpers.
//!
//! A frame on the wire is:
//! ```text
//! END | payload with END -> ESC ESC_END, ESC -> ESC ESC_ESC | END
//! ```
//! There is no length field; frames are found by their delimiters alone.
//!
//! The four core operations are free functions over a
//! [`CharTransport`](slipline_transport::CharTransport) or a plain slice:
//! - [`recv_frame`] / [`send_frame`]
//! - [`verify_crc16`] / [`append_crc16`]
//!
//! [`FrameReader`] and [`FrameWriter`] layer owned frames and an optional
//! CRC trailer on top. With the `async` feature, [`SlipCodec`] plugs the same
//! framing into `tokio_util::codec`.

pub mod checksum;
#[cfg(feature = "async")]
pub mod codec;
pub mod consts;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod reader;
pub mod writer;

pub use checksum::{append_crc16, crc16_status, verify_crc16, CRC_LEN};
#[cfg(feature = "async")]
pub use codec::SlipCodec;
pub use consts::{END, ESC, ESC_END, ESC_ESC, MAX_FRAME_LEN};
pub use crc::{crc16, crc16_update};
pub use decoder::recv_frame;
pub use encoder::{encode_into, encoded_len, send_frame};
pub use error::{FrameError, Result};
pub use frame::{Frame, FrameConfig};
pub use reader::FrameReader;
pub use writer::FrameWriter;
