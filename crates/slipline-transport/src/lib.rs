//! Character transport abstraction for SLIP links.
//!
//! The framing layer only ever talks to a [`CharTransport`]: "try to receive
//! one character" and "send one character". Anything that can provide those
//! two primitives is interchangeable:
//! - [`MemoryTransport`] for tests and loopback use
//! - [`StreamTransport`] over any `Read + Write` byte stream
//! - [`LinkStream`] for Unix sockets, TCP and character devices
//!
//! This is the lowest layer of slipline. Baud rates, UART setup and the like
//! stay with whoever opens the underlying device.

pub mod error;
pub mod memory;
pub mod stream;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use stream::{LinkStream, StreamTransport};
pub use traits::CharTransport;

#[cfg(unix)]
pub use uds::UnixLinkListener;
