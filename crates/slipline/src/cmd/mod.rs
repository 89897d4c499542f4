use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod crc;
pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one payload as a SLIP frame.
    Encode(EncodeArgs),
    /// Decode SLIP frames from a file or stdin.
    Decode(DecodeArgs),
    /// Send a single frame to a socket, TCP endpoint or device.
    Send(SendArgs),
    /// Listen on a Unix socket and print received frames.
    Listen(ListenArgs),
    /// Compute, append or verify embedded CRC-16 values.
    Crc(CrcArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: Option<OutputFormat>) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, resolve(format)),
        Command::Send(args) => send::run(args, resolve(format)),
        Command::Listen(args) => listen::run(args, resolve(format)),
        Command::Crc(args) => crc::run(args, resolve(format)),
        Command::Version(args) => version::run(args),
    }
}

fn resolve(format: Option<OutputFormat>) -> OutputFormat {
    format.unwrap_or_else(OutputFormat::default_for_stdout)
}

/// Payload source shared by `encode` and `send`.
#[derive(Args, Debug, Default)]
pub struct PayloadArgs {
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Hex payload (whitespace ignored).
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
}

impl PayloadArgs {
    pub fn resolve(&self) -> CliResult<Vec<u8>> {
        if let Some(data) = &self.data {
            return Ok(data.as_bytes().to_vec());
        }
        if let Some(text) = &self.hex {
            return parse_hex(text);
        }
        if let Some(path) = &self.file {
            return fs::read(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
        }
        Ok(Vec::new())
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Embed a CRC-16 trailer after the payload.
    #[arg(long)]
    pub crc: bool,
    /// Write the frame to a file instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Read frames from a file. Default: stdin.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Receive buffer capacity; longer frames are truncated.
    #[arg(long, default_value_t = 255, value_parser = clap::value_parser!(u8).range(1..))]
    pub capacity: u8,
    /// Check and strip a CRC-16 trailer on every frame.
    #[arg(long)]
    pub crc: bool,
    /// Stop after N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Unix socket path, tcp://HOST:PORT, or dev:/path/to/tty.
    pub target: String,
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Embed a CRC-16 trailer after the payload.
    #[arg(long)]
    pub crc: bool,
    /// Write timeout for sockets (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Check and strip a CRC-16 trailer on every frame.
    #[arg(long)]
    pub crc: bool,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Receive buffer capacity; longer frames are truncated.
    #[arg(long, default_value_t = 255, value_parser = clap::value_parser!(u8).range(1..))]
    pub capacity: u8,
}

#[derive(Args, Debug)]
pub struct CrcArgs {
    #[command(subcommand)]
    pub command: CrcCommand,
}

#[derive(Subcommand, Debug)]
pub enum CrcCommand {
    /// Append a little-endian CRC-16 to HEX and print the result.
    Append {
        /// Data bytes as hex.
        hex: String,
    },
    /// Verify the CRC-16 embedded in HEX.
    Verify {
        /// Buffer bytes as hex, CRC included.
        hex: String,
        /// Byte offset of the CRC. Default: the last two bytes.
        #[arg(long)]
        offset: Option<usize>,
    },
    /// Compute the plain CRC-16 of HEX.
    Compute {
        /// Data bytes as hex.
        hex: String,
    },
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .unwrap_or(&cleaned);
    hex::decode(cleaned).map_err(|err| CliError::new(USAGE, format!("invalid hex input: {err}")))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_spacing_and_prefix() {
        assert_eq!(parse_hex("c0 db dc").unwrap(), vec![0xC0, 0xDB, 0xDC]);
        assert_eq!(parse_hex("0xC0DB").unwrap(), vec![0xC0, 0xDB]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        assert_eq!(parse_hex("zz").unwrap_err().code, USAGE);
        assert_eq!(parse_hex("abc").unwrap_err().code, USAGE);
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn payload_sources() {
        let args = PayloadArgs {
            data: Some("hi".into()),
            ..PayloadArgs::default()
        };
        assert_eq!(args.resolve().unwrap(), b"hi");

        let args = PayloadArgs {
            hex: Some("0001".into()),
            ..PayloadArgs::default()
        };
        assert_eq!(args.resolve().unwrap(), vec![0x00, 0x01]);

        assert!(PayloadArgs::default().resolve().unwrap().is_empty());
    }
}
