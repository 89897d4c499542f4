use std::fs::File;
use std::io::{self, Read, Write};

use serde::Serialize;
use slipline_frame::{Frame, FrameConfig, FrameError, FrameReader};
use slipline_transport::{CharTransport, StreamTransport};
use tracing::{debug, warn};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_frame, OutputFormat};

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub(crate) struct DecodeSummary {
    pub frames: usize,
    pub rejected: usize,
}

/// Receive-only byte source for `decode`.
enum Input {
    Stdin(io::StdinLock<'static>),
    File(File),
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Input::Stdin(stdin) => stdin.read(buf),
            Input::File(file) => file.read(buf),
        }
    }
}

impl Write for Input {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "decode input is read-only",
        ))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let (input, source) = match &args.file {
        Some(path) => (
            Input::File(
                File::open(path)
                    .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?,
            ),
            path.display().to_string(),
        ),
        None => (Input::Stdin(io::stdin().lock()), "stdin".to_string()),
    };

    let config = FrameConfig {
        max_frame_len: usize::from(args.capacity),
        crc16: args.crc,
    };
    let summary = decode_frames(StreamTransport::new(input), config, args.count, |index, frame| {
        print_frame(frame, &source, index, format);
    })?;
    debug!(frames = summary.frames, rejected = summary.rejected, "decode finished");

    if summary.rejected > 0 {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

/// Decode frames from `transport` as they arrive, handing each to `on_frame`.
///
/// Frames that fail the CRC check are counted and skipped. Decoding ends
/// when the input closes (a partial trailing frame is dropped) or once
/// `limit` frames have been delivered.
pub(crate) fn decode_frames<T, F>(
    transport: T,
    config: FrameConfig,
    limit: Option<usize>,
    mut on_frame: F,
) -> CliResult<DecodeSummary>
where
    T: CharTransport,
    F: FnMut(usize, &Frame),
{
    let mut reader = FrameReader::with_config(transport, config);
    let mut summary = DecodeSummary::default();

    while limit.is_none_or(|limit| summary.frames < limit) {
        match reader.read_frame() {
            Ok(frame) => {
                on_frame(summary.frames, &frame);
                summary.frames += 1;
            }
            Err(err) if err.is_closed() => break,
            Err(err @ (FrameError::CrcMismatch { .. } | FrameError::FrameTooShort { .. })) => {
                warn!(error = %err, "skipping invalid frame");
                summary.rejected += 1;
            }
            Err(err) => return Err(frame_error("decode failed", err)),
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use slipline_transport::MemoryTransport;

    use super::*;
    use crate::cmd::encode::encode_payload;

    fn collect(input: &[u8], config: FrameConfig, limit: Option<usize>) -> (Vec<Vec<u8>>, DecodeSummary) {
        let mut frames = Vec::new();
        let summary = decode_frames(MemoryTransport::with_input(input), config, limit, |_, frame| {
            frames.push(frame.payload.to_vec());
        })
        .unwrap();
        (frames, summary)
    }

    #[test]
    fn decodes_concatenated_frames() {
        let mut wire = encode_payload(b"one", false).unwrap();
        wire.extend(encode_payload(&[0xC0, 0xDB], false).unwrap());

        let (frames, summary) = collect(&wire, FrameConfig::default(), None);
        assert_eq!(frames, vec![b"one".to_vec(), vec![0xC0, 0xDB]]);
        assert_eq!(summary, DecodeSummary { frames: 2, rejected: 0 });
    }

    #[test]
    fn count_limits_output() {
        let mut wire = Vec::new();
        for payload in [b"a", b"b", b"c"] {
            wire.extend(encode_payload(payload, false).unwrap());
        }

        let (frames, _) = collect(&wire, FrameConfig::default(), Some(2));
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn bad_crc_frames_are_counted_and_skipped() {
        let mut bad = encode_payload(b"bad", true).unwrap();
        bad[1] ^= 0x01;
        let mut wire = bad;
        wire.extend(encode_payload(b"good", true).unwrap());

        let (frames, summary) = collect(&wire, FrameConfig::with_crc16(), None);
        assert_eq!(frames, vec![b"good".to_vec()]);
        assert_eq!(summary, DecodeSummary { frames: 1, rejected: 1 });
    }

    #[test]
    fn partial_trailing_frame_is_dropped() {
        let mut wire = encode_payload(b"whole", false).unwrap();
        wire.extend([0xC0, b'p', b'a', b'r']);

        let (frames, _) = collect(&wire, FrameConfig::default(), None);
        assert_eq!(frames, vec![b"whole".to_vec()]);
    }

    #[test]
    fn stops_at_limit_without_reading_further() {
        let mut wire = encode_payload(b"first", false).unwrap();
        let first_len = wire.len();
        wire.extend(encode_payload(b"second", false).unwrap());

        let mut link = MemoryTransport::with_input(&wire);
        let summary = decode_frames(&mut link, FrameConfig::default(), Some(1), |_, frame| {
            assert_eq!(frame.payload.as_ref(), b"first");
        })
        .unwrap();
        assert_eq!(summary.frames, 1);
        assert_eq!(link.pending(), wire.len() - first_len);
    }

    #[test]
    fn read_only_input_rejects_writes() {
        let mut transport = StreamTransport::with_read_chunk(
            ReadOnly(Cursor::new(encode_payload(b"abc", false).unwrap())),
            2,
        );
        let mut frames = Vec::new();
        decode_frames(&mut transport, FrameConfig::default(), None, |_, frame| {
            frames.push(frame.payload.to_vec());
        })
        .unwrap();
        assert_eq!(frames, vec![b"abc".to_vec()]);

        transport.send(0xC0).unwrap();
        assert!(transport.flush().is_err());
    }

    struct ReadOnly(Cursor<Vec<u8>>);

    impl Read for ReadOnly {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Write for ReadOnly {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::Unsupported))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
