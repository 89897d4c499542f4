use std::fs;

use serde::Serialize;
use slipline_frame::{FrameConfig, FrameWriter};
use slipline_transport::MemoryTransport;
use tracing::debug;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_raw, print_record, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput {
    payload_size: usize,
    frame_size: usize,
    crc: bool,
    frame_hex: String,
}

/// Frame bytes go to stdout as-is unless `--format` asks otherwise, so the
/// output can be piped straight into `decode` or a device.
pub fn run(args: EncodeArgs, format: Option<OutputFormat>) -> CliResult<i32> {
    let payload = args.payload.resolve()?;
    let wire = encode_payload(&payload, args.crc)?;
    debug!(
        payload_size = payload.len(),
        frame_size = wire.len(),
        "encoded frame"
    );

    if let Some(path) = &args.out {
        fs::write(path, &wire)
            .map_err(|err| io_error(&format!("failed writing {}", path.display()), err))?;
    }

    match format {
        None | Some(OutputFormat::Raw) => {
            if args.out.is_none() {
                print_raw(&wire);
            }
        }
        Some(OutputFormat::Hex) => println!("{}", hex::encode(&wire)),
        Some(format) => print_record(
            &EncodeOutput {
                payload_size: payload.len(),
                frame_size: wire.len(),
                crc: args.crc,
                frame_hex: hex::encode(&wire),
            },
            format,
        ),
    }

    Ok(SUCCESS)
}

pub(crate) fn encode_payload(payload: &[u8], crc: bool) -> CliResult<Vec<u8>> {
    let config = FrameConfig {
        crc16: crc,
        ..FrameConfig::default()
    };
    let mut writer = FrameWriter::with_config(MemoryTransport::new(), config);
    writer
        .send(payload)
        .map_err(|err| frame_error("encode failed", err))?;
    Ok(writer.into_inner().take_sent())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::DATA_INVALID;

    #[test]
    fn encodes_with_escapes() {
        let wire = encode_payload(&[0x01, 0xC0, 0xDB], false).unwrap();
        assert_eq!(wire, [0xC0, 0x01, 0xDB, 0xDC, 0xDB, 0xDD, 0xC0]);
    }

    #[test]
    fn crc_adds_two_bytes() {
        let plain = encode_payload(b"abc", false).unwrap();
        let with_crc = encode_payload(b"abc", true).unwrap();
        assert!(with_crc.len() >= plain.len() + 2);
    }

    #[test]
    fn oversized_payload_is_data_invalid() {
        let err = encode_payload(&[0u8; 256], false).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);

        let err = encode_payload(&[0u8; 254], true).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }
}
