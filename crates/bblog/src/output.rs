use std::io::IsTerminal;

use bblog_schema::device::{PasscodeStatus, ResponseCode, SensorState};
use bblog_schema::{FieldDescriptor, TextFormat};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
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
pub struct FieldOutput<'a> {
    pub name: &'a str,
    pub columns: &'a [String],
    pub unit: &'a str,
    pub alias: Option<&'a str>,
    pub enable_mask: Option<u32>,
    pub text_format: TextFormat,
}

impl<'a> From<&'a FieldDescriptor> for FieldOutput<'a> {
    fn from(field: &'a FieldDescriptor) -> Self {
        let alias = Some(field.api_name()).filter(|name| *name != field.proto_name());
        Self {
            name: field.proto_name(),
            columns: field.columns(),
            unit: field.unit(),
            alias,
            enable_mask: field.enable_mask(),
            text_format: field.text_format(),
        }
    }
}

pub fn print_fields(fields: &[FieldOutput<'_>], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&fields),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "COLUMNS", "UNIT", "ALIAS", "MASK", "TEXT"]);
            for field in fields {
                table.add_row(vec![
                    field.name.to_string(),
                    field.columns.join(" "),
                    field.unit.to_string(),
                    field.alias.unwrap_or("").to_string(),
                    field.enable_mask.map(mask_hex).unwrap_or_default(),
                    text_format(field.text_format),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for field in fields {
                println!(
                    "{:<14} {:<16} {:<6} {:<6} {}",
                    field.name,
                    field.columns.join(","),
                    field.unit,
                    text_format(field.text_format),
                    field.enable_mask.map(mask_hex).unwrap_or_default()
                );
            }
        }
    }
}

#[derive(Serialize)]
pub struct MaskOutput {
    pub previous: u32,
    pub mask: u32,
    pub sensors: Vec<SensorState>,
}

pub fn print_mask(out: &MaskOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SENSOR", "BIT", "ENABLED"]);
            for sensor in &out.sensors {
                table.add_row(vec![
                    sensor.name.to_string(),
                    mask_hex(sensor.mask),
                    sensor.enabled.to_string(),
                ]);
            }
            println!("mask: {} (was {})", mask_hex(out.mask), mask_hex(out.previous));
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("mask={} previous={}", mask_hex(out.mask), mask_hex(out.previous));
            for sensor in &out.sensors {
                println!("  {:<10} : {}", sensor.name, sensor.enabled);
            }
        }
    }
}

#[derive(Serialize)]
pub struct GattOutput {
    pub name: &'static str,
    pub kind: &'static str,
    pub uuid: String,
}

pub fn print_gatt(entries: &[GattOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(entries),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "KIND", "UUID"]);
            for entry in entries {
                table.add_row(vec![entry.name, entry.kind, entry.uuid.as_str()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for entry in entries {
                println!("{:<20} {:<15} {}", entry.name, entry.kind, entry.uuid);
            }
        }
    }
}

/// Bytes to write to one characteristic.
#[derive(Serialize)]
pub struct WriteOutput {
    pub characteristic: &'static str,
    pub uuid: String,
    pub value: String,
}

pub fn print_writes(writes: &[WriteOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(writes),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHARACTERISTIC", "UUID", "VALUE"]);
            for write in writes {
                table.add_row(vec![write.characteristic, write.uuid.as_str(), write.value.as_str()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for write in writes {
                println!("{} <- {}", write.characteristic, write.value);
            }
        }
    }
}

#[derive(Serialize)]
pub struct ReadOutput {
    pub characteristic: &'static str,
    pub value: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensors: Option<Vec<SensorState>>,
}

pub fn print_read(out: &ReadOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{} = {}", out.characteristic, out.value);
            for sensor in out.sensors.iter().flatten() {
                println!("  {:<10} : {}", sensor.name, sensor.enabled);
            }
        }
    }
}

#[derive(Serialize)]
pub struct ResponseOutput {
    pub opcode: u8,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ResponseCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passcode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_unlock: Option<bool>,
}

impl ResponseOutput {
    pub fn passcode(opcode: u8, data: String, status: PasscodeStatus) -> Self {
        Self {
            opcode,
            data,
            status: None,
            passcode: Some(status.name()),
            needs_unlock: Some(status.needs_unlock()),
        }
    }
}

pub fn print_response(out: &ResponseOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("opcode=0x{:02x} data={}", out.opcode, out.data);
            if let Some(status) = out.status {
                println!("  status     : {status:?}");
            }
            if let Some(passcode) = out.passcode {
                println!("  passcode   : {passcode}");
            }
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn text_format(format: TextFormat) -> String {
    format!("{}.{}f", format.width, format.precision)
}

pub fn mask_hex(mask: u32) -> String {
    format!("0x{mask:04x}")
}
