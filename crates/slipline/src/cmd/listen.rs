use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
#[cfg(unix)]
use std::time::Duration;

use slipline_transport::{CharTransport, TransportError};

use crate::cmd::ListenArgs;
use crate::exit::{CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

/// Read timeout on accepted links, so Ctrl-C is noticed mid-frame.
#[cfg(unix)]
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[cfg(unix)]
pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    use slipline_frame::{FrameConfig, FrameError, FrameReader};
    use slipline_transport::{StreamTransport, UnixLinkListener};
    use tracing::{info, warn};

    use crate::exit::{frame_error, transport_error, SUCCESS};
    use crate::output::print_frame;

    let listener =
        UnixLinkListener::bind(&args.path).map_err(|err| transport_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    let wake_path = listener.path().to_path_buf();
    install_ctrlc_handler(running.clone(), move || {
        // Unblock a pending accept.
        let _ = std::os::unix::net::UnixStream::connect(&wake_path);
    })?;

    let config = FrameConfig {
        max_frame_len: usize::from(args.capacity),
        crc16: args.crc,
    };
    let mut printed = 0usize;
    let mut peers = 0usize;

    while running.load(Ordering::SeqCst) {
        let stream = listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        if !running.load(Ordering::SeqCst) {
            break;
        }
        stream
            .set_read_timeout(Some(POLL_INTERVAL))
            .map_err(|err| transport_error("accept failed", err))?;

        peers += 1;
        let source = format!("peer-{peers}");
        info!(peer = %source, "link connected");

        let transport = Stoppable::new(StreamTransport::new(stream), running.clone());
        let mut reader = FrameReader::with_config(transport, config.clone());

        loop {
            let frame = match reader.read_frame() {
                Ok(frame) => frame,
                Err(err) if err.is_closed() => break,
                Err(FrameError::CrcMismatch { .. } | FrameError::FrameTooShort { .. }) => {
                    continue
                }
                Err(err) => return Err(frame_error("receive failed", err)),
            };

            print_frame(&frame, &source, printed, format);
            printed = printed.saturating_add(1);

            if args.count.is_some_and(|count| printed >= count) {
                return Ok(SUCCESS);
            }
        }

        if running.load(Ordering::SeqCst) {
            info!(peer = %source, "link closed");
        } else {
            warn!("interrupted");
        }
    }

    Ok(SUCCESS)
}

#[cfg(not(unix))]
pub fn run(_args: ListenArgs, _format: OutputFormat) -> CliResult<i32> {
    Err(CliError::new(
        crate::exit::USAGE,
        "listen requires unix domain sockets",
    ))
}

fn install_ctrlc_handler<F>(running: Arc<AtomicBool>, on_stop: F) -> CliResult<()>
where
    F: Fn() + Send + 'static,
{
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        on_stop();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

/// Wraps a transport so it reports [`TransportError::Closed`] once `running`
/// is cleared, letting a blocked frame read end.
pub(crate) struct Stoppable<T> {
    inner: T,
    running: Arc<AtomicBool>,
}

impl<T> Stoppable<T> {
    pub(crate) fn new(inner: T, running: Arc<AtomicBool>) -> Self {
        Self { inner, running }
    }
}

impl<T: CharTransport> CharTransport for Stoppable<T> {
    fn try_recv(&mut self) -> slipline_transport::Result<Option<u8>> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.inner.try_recv()
    }

    fn send(&mut self, byte: u8) -> slipline_transport::Result<()> {
        self.inner.send(byte)
    }

    fn flush(&mut self) -> slipline_transport::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use slipline_frame::{recv_frame, send_frame};
    use slipline_transport::MemoryTransport;

    use super::*;

    #[test]
    fn stoppable_passes_through_while_running() {
        let running = Arc::new(AtomicBool::new(true));
        let mut wire = MemoryTransport::new();
        send_frame(&mut wire, b"go").unwrap();
        wire.loopback();

        let mut transport = Stoppable::new(wire, running);
        let mut buf = [0u8; 8];
        let n = recv_frame(&mut transport, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"go");
    }

    #[test]
    fn stoppable_closes_a_waiting_read() {
        let running = Arc::new(AtomicBool::new(true));
        let mut inner = MemoryTransport::with_input([0xC0, b'x']);
        inner.push_gap(3);

        let mut transport = Stoppable::new(inner, running.clone());
        assert_eq!(transport.try_recv().unwrap(), Some(0xC0));
        running.store(false, Ordering::SeqCst);
        assert!(matches!(transport.try_recv(), Err(TransportError::Closed)));
    }
}
