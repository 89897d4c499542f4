use std::path::PathBuf;

use serde::Serialize;
use slipline_frame::{FrameConfig, FrameWriter};
use slipline_transport::{LinkStream, StreamTransport};

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_record, OutputFormat};

/// Where `send` delivers its frame.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Target {
    Unix(PathBuf),
    Tcp(String),
    Device(PathBuf),
}

impl Target {
    pub(crate) fn parse(input: &str) -> CliResult<Self> {
        if let Some(addr) = input.strip_prefix("tcp://") {
            if addr.is_empty() {
                return Err(CliError::new(USAGE, "tcp target needs HOST:PORT"));
            }
            return Ok(Self::Tcp(addr.to_string()));
        }
        if let Some(path) = input.strip_prefix("dev:") {
            if path.is_empty() {
                return Err(CliError::new(USAGE, "device target needs a path"));
            }
            return Ok(Self::Device(PathBuf::from(path)));
        }
        if input.is_empty() {
            return Err(CliError::new(USAGE, "target must not be empty"));
        }
        Ok(Self::Unix(PathBuf::from(input)))
    }

    fn open(&self) -> CliResult<LinkStream> {
        let stream = match self {
            #[cfg(unix)]
            Self::Unix(path) => LinkStream::connect_unix(path),
            #[cfg(not(unix))]
            Self::Unix(_) => {
                return Err(CliError::new(
                    USAGE,
                    "unix socket targets are not supported on this platform",
                ))
            }
            Self::Tcp(addr) => LinkStream::connect_tcp(addr),
            Self::Device(path) => LinkStream::open_device(path),
        };
        stream.map_err(|err| transport_error("connect failed", err))
    }
}

#[derive(Serialize)]
struct SendOutput<'a> {
    target: &'a str,
    link: &'static str,
    payload_size: usize,
    crc: bool,
}

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let target = Target::parse(&args.target)?;
    let payload = args.payload.resolve()?;

    let stream = target.open()?;
    stream
        .set_write_timeout(Some(timeout))
        .map_err(|err| transport_error("set timeout failed", err))?;
    let link = stream.kind();

    let config = FrameConfig {
        crc16: args.crc,
        ..FrameConfig::default()
    };
    let mut writer = FrameWriter::with_config(StreamTransport::new(stream), config);
    writer
        .send(&payload)
        .map_err(|err| frame_error("send failed", err))?;

    print_record(
        &SendOutput {
            target: &args.target,
            link,
            payload_size: payload.len(),
            crc: args.crc,
        },
        format,
    );

    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_targets() {
        assert_eq!(
            Target::parse("/tmp/link.sock").unwrap(),
            Target::Unix(PathBuf::from("/tmp/link.sock"))
        );
        assert_eq!(
            Target::parse("tcp://127.0.0.1:4000").unwrap(),
            Target::Tcp("127.0.0.1:4000".to_string())
        );
        assert_eq!(
            Target::parse("dev:/dev/ttyUSB0").unwrap(),
            Target::Device(PathBuf::from("/dev/ttyUSB0"))
        );
    }

    #[test]
    fn rejects_empty_targets() {
        assert_eq!(Target::parse("").unwrap_err().code, USAGE);
        assert_eq!(Target::parse("tcp://").unwrap_err().code, USAGE);
        assert_eq!(Target::parse("dev:").unwrap_err().code, USAGE);
    }

    #[test]
    fn tcp_send_delivers_frame() {
        use std::io::Read;
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            conn.read_to_end(&mut buf).unwrap();
            buf
        });

        let target = Target::parse(&format!("tcp://{addr}")).unwrap();
        let stream = target.open().unwrap();
        assert_eq!(stream.kind(), "tcp");
        let mut writer = FrameWriter::new(StreamTransport::new(stream));
        writer.send(b"hi").unwrap();
        drop(writer);

        assert_eq!(server.join().unwrap(), [0xC0, b'h', b'i', 0xC0]);
    }
}
