use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use bblog_schema::device::Gatt;
use bblog_stream::RowFormat;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod fields;
pub mod gatt;
pub mod mask;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a capture of log notifications into sensor rows.
    Decode(DecodeArgs),
    /// List the fields a log entry can carry.
    Fields(FieldsArgs),
    /// Compute a sensor enable mask.
    Mask(MaskArgs),
    /// GATT layout, command and configuration encoding.
    Gatt(GattArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args),
        Command::Fields(args) => fields::run(args, format),
        Command::Mask(args) => mask::run(args, format),
        Command::Gatt(args) => gatt::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file with one hex encoded notification per line, `-` for stdin.
    pub capture: PathBuf,
    /// Row format.
    #[arg(long, default_value = "txt")]
    pub fmt: RowFormat,
    /// Write raw readings instead of physical units.
    #[arg(long)]
    pub raw: bool,
    /// Stop after N entries.
    #[arg(long, short = 'n', value_name = "N")]
    pub num: Option<usize>,
    /// Write rows to a file instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Treat the first corrupt frame as fatal instead of retrying with
    /// reordered packets.
    #[arg(long)]
    pub no_recovery: bool,
    /// Packets buffered before the transfer fails.
    #[arg(long, value_name = "PACKETS")]
    pub buffer_capacity: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct FieldsArgs {
    /// Only fields with their own sensor enable bit.
    #[arg(long)]
    pub sensors: bool,
}

#[derive(Args, Debug)]
pub struct MaskArgs {
    /// Current enable bit field (decimal or 0x hex).
    #[arg(long, default_value = "0", value_parser = parse_mask)]
    pub current: u32,
    /// Sensors to enable (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub enable: Vec<String>,
    /// Sensors to disable (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub disable: Vec<String>,
}

#[derive(Args, Debug)]
pub struct GattArgs {
    #[command(subcommand)]
    pub action: GattAction,
}

#[derive(Subcommand, Debug)]
pub enum GattAction {
    /// List services and characteristics with their UUIDs.
    Layout,
    /// Encode configuration characteristic writes.
    Config(ConfigArgs),
    /// Decode a configuration value read from the device.
    Read(ReadArgs),
    /// Encode a command write.
    Command(CommandArgs),
    /// Encode the command that sets or unlocks the passcode.
    Passcode(PasscodeArgs),
    /// Check a command response notification.
    Response(ResponseArgs),
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Switch logging on or off.
    #[arg(long)]
    pub logging: Option<bool>,
    /// Log interval in seconds.
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u32>,
    /// Sensor enable bit field (decimal or 0x hex).
    #[arg(long, value_name = "MASK", value_parser = parse_mask)]
    pub sensors: Option<u32>,
    /// Real-time IMU rate.
    #[arg(long, value_name = "RATE")]
    pub rt_imu: Option<u32>,
}

/// Configuration characteristics holding a u32.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigValue {
    LogEnable,
    SensorEnable,
    Interval,
    RtImu,
}

impl ConfigValue {
    pub fn characteristic(self) -> Gatt {
        match self {
            Self::LogEnable => Gatt::CfgLogEnable,
            Self::SensorEnable => Gatt::CfgSensorEnable,
            Self::Interval => Gatt::CfgInterval,
            Self::RtImu => Gatt::CfgRtImu,
        }
    }
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Characteristic the value was read from.
    pub characteristic: ConfigValue,
    /// Value as read, hex encoded.
    #[arg(value_parser = parse_hex_arg)]
    pub value: HexBytes,
}

#[derive(Args, Debug)]
pub struct CommandArgs {
    /// Opcode (decimal or 0x hex).
    #[arg(value_parser = parse_byte)]
    pub opcode: u8,
    /// Command data, hex encoded.
    #[arg(long, value_parser = parse_hex_arg)]
    pub data: Option<HexBytes>,
}

#[derive(Args, Debug)]
pub struct PasscodeArgs {
    /// Eight ASCII characters.
    pub passcode: String,
}

#[derive(Args, Debug)]
pub struct ResponseArgs {
    /// Opcode of the request (decimal or 0x hex).
    #[arg(value_parser = parse_byte)]
    pub opcode: u8,
    /// Response notification, hex encoded.
    #[arg(value_parser = parse_hex_arg)]
    pub response: HexBytes,
}

/// Bytes given as one hex argument.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_mask(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|err| format!("invalid mask '{value}': {err}"))
}

fn parse_byte(value: &str) -> Result<u8, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|err| format!("invalid byte '{value}': {err}"))
}

fn parse_hex_arg(value: &str) -> Result<HexBytes, String> {
    parse_hex(value).map(HexBytes)
}

/// Hex digits, whitespace between bytes allowed.
pub(crate) fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }

    let mut out = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks(2) {
        let text = std::str::from_utf8(pair).map_err(|err| err.to_string())?;
        let byte = u8::from_str_radix(text, 16).map_err(|_| format!("invalid hex byte '{text}'"))?;
        out.push(byte);
    }
    Ok(out)
}
