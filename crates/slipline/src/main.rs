mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "slipline", version, about = "SLIP framing and CRC-16 toolkit")]
struct Cli {
    /// Output format. Defaults to table on a terminal, json otherwise.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        env = "SLIPLINE_LOG_FORMAT",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "SLIPLINE_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match cmd::run(cli.command, cli.format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::CrcCommand;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "slipline",
            "send",
            "tcp://127.0.0.1:4000",
            "--hex",
            "c0db01",
            "--crc",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert!(args.crc);
                assert_eq!(args.payload.hex.as_deref(), Some("c0db01"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "slipline", "encode", "--hex", "c0", "--data", "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_crc_verify_with_offset() {
        let cli = Cli::try_parse_from(["slipline", "crc", "verify", "0102abcd", "--offset", "2"])
            .expect("crc verify args should parse");

        match cli.command {
            Command::Crc(args) => assert!(matches!(
                args.command,
                CrcCommand::Verify {
                    offset: Some(2),
                    ..
                }
            )),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["slipline", "decode", "--format", "hex", "--log-level", "warn"])
            .expect("global flags should parse after the subcommand");
        assert!(matches!(cli.format, Some(OutputFormat::Hex)));
        assert!(matches!(cli.log_level, LogLevel::Warn));
    }

    #[test]
    fn decode_capacity_is_bounded() {
        assert!(Cli::try_parse_from(["slipline", "decode", "--capacity", "0"]).is_err());
        assert!(Cli::try_parse_from(["slipline", "decode", "--capacity", "256"]).is_err());
        assert!(Cli::try_parse_from(["slipline", "decode", "--capacity", "255"]).is_ok());
    }
}
