use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;
use slipline_frame::Frame;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
    Hex,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    source: &'a str,
    index: usize,
    payload_size: usize,
    truncated: bool,
    payload_hex: String,
    payload: String,
    timestamp: String,
}

/// Print one received frame. `index` counts frames from the same source.
pub fn print_frame(frame: &Frame, source: &str, index: usize, format: OutputFormat) {
    let payload = frame.payload.as_ref();
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                source,
                index,
                payload_size: payload.len(),
                truncated: frame.truncated,
                payload_hex: hex::encode(payload),
                payload: payload_preview(payload),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "SIZE", "TRUNCATED", "SOURCE", "PAYLOAD"])
                .add_row(vec![
                    index.to_string(),
                    payload.len().to_string(),
                    frame.truncated.to_string(),
                    source.to_string(),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{index} size={}{} source={source} payload={}",
                payload.len(),
                if frame.truncated { " (truncated)" } else { "" },
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => print_raw(payload),
        OutputFormat::Hex => println!("{}", hex::encode(payload)),
    }
}

/// Print a flat record (command summary) in the requested format.
///
/// Table and pretty output list the record's top-level fields by name.
pub fn print_record<T: Serialize>(record: &T, format: OutputFormat) {
    let value = serde_json::to_value(record).unwrap_or(Value::Null);
    if let OutputFormat::Json = format {
        println!("{value}");
        return;
    }

    let fields: Vec<(String, String)> = match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| (key, render_value(&value)))
            .collect(),
        other => vec![("value".to_string(), render_value(&other))],
    };

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (key, value) in fields {
                table.add_row(vec![key, value]);
            }
            println!("{table}");
        }
        _ => {
            let line: Vec<String> = fields
                .into_iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            println!("{}", line.join(" "));
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// UTF-8 text when printable, otherwise hex.
fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => format!("0x{}", hex::encode(payload)),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
