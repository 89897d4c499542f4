use serde::Serialize;
use slipline_frame::{append_crc16, crc16, crc16_status, verify_crc16, FrameError, CRC_LEN};

use crate::cmd::{parse_hex, CrcArgs, CrcCommand};
use crate::exit::{frame_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct AppendOutput {
    data_size: usize,
    crc: String,
    output: String,
}

#[derive(Serialize)]
struct VerifyOutput {
    offset: usize,
    valid: bool,
    received: String,
    computed: String,
    status: u16,
}

#[derive(Serialize)]
struct ComputeOutput {
    data_size: usize,
    crc: String,
}

pub fn run(args: CrcArgs, format: OutputFormat) -> CliResult<i32> {
    match args.command {
        CrcCommand::Append { hex } => append(&parse_hex(&hex)?, format),
        CrcCommand::Verify { hex, offset } => verify(&parse_hex(&hex)?, offset, format),
        CrcCommand::Compute { hex } => {
            let data = parse_hex(&hex)?;
            print_record(
                &ComputeOutput {
                    data_size: data.len(),
                    crc: format_crc(crc16(&data)),
                },
                format,
            );
            Ok(SUCCESS)
        }
    }
}

fn append(data: &[u8], format: OutputFormat) -> CliResult<i32> {
    let mut buf = data.to_vec();
    buf.resize(data.len() + CRC_LEN, 0);
    let total =
        append_crc16(&mut buf, data.len()).map_err(|err| frame_error("append failed", err))?;
    let crc = u16::from_le_bytes([buf[total - 2], buf[total - 1]]);

    if let OutputFormat::Hex | OutputFormat::Raw = format {
        println!("{}", hex::encode(&buf));
    } else {
        print_record(
            &AppendOutput {
                data_size: data.len(),
                crc: format_crc(crc),
                output: hex::encode(&buf),
            },
            format,
        );
    }
    Ok(SUCCESS)
}

fn verify(buf: &[u8], offset: Option<usize>, format: OutputFormat) -> CliResult<i32> {
    let offset = match offset {
        Some(offset) => offset,
        None => buf.len().checked_sub(CRC_LEN).ok_or_else(|| {
            CliError::new(USAGE, format!("need at least {CRC_LEN} bytes to verify"))
        })?,
    };

    let (valid, received, computed) = match verify_crc16(buf, offset) {
        Ok(crc) => (true, crc, crc),
        Err(FrameError::CrcMismatch { received, computed }) => (false, received, computed),
        Err(err) => return Err(frame_error("verify failed", err)),
    };

    print_record(
        &VerifyOutput {
            offset,
            valid,
            received: format_crc(received),
            computed: format_crc(computed),
            status: crc16_status(buf, offset),
        },
        format,
    );

    if valid {
        Ok(SUCCESS)
    } else {
        Ok(DATA_INVALID)
    }
}

fn format_crc(crc: u16) -> String {
    format!("{crc:#06x}")
}
