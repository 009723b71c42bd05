//! GATT layout and command protocol of the BlueBerry logger.
//!
//! Transport independent: these helpers only build and check the bytes that
//! a BLE client writes to or reads from the device characteristics.

use serde::Serialize;

use crate::error::{Result, SchemaError};
use crate::registry::FieldRegistry;

/// Bit set in a command response id.
pub const RESPONSE_FLAG: u8 = 0x80;

/// Passcodes are exactly this many ASCII characters.
pub const PASSCODE_LEN: usize = 8;

/// Vendor UUID `c9f6XXXX-9f9b-fba4-5847-7fd701bf59f2`.
pub fn vendor_uuid(n: u16) -> String {
    format!("c9f6{n:04x}-9f9b-fba4-5847-7fd701bf59f2")
}

/// Bluetooth SIG base UUID `0000XXXX-0000-1000-8000-00805f9b34fb`.
pub fn standard_uuid(n: u16) -> String {
    format!("0000{n:04x}-0000-1000-8000-00805f9b34fb")
}

/// Services and characteristics used by the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gatt {
    /// Log service.
    LogService,
    /// Real-time sensor data notifications (log entry frames).
    SensorsRtd,
    /// Stored log notifications (log entry frames).
    SensorsLog,
    /// Command write (opcode, data).
    CmdTx,
    /// Command response notifications (response code, data).
    CmdRx,
    /// Logging on/off, u32.
    CfgLogEnable,
    /// Sensor enable bit field, u32.
    CfgSensorEnable,
    /// Log interval in seconds, u32.
    CfgInterval,
    /// Real-time IMU rate, u32.
    CfgRtImu,
    DeviceInformation,
    SerialNumber,
    SoftwareRevision,
    Manufacturer,
}

impl Gatt {
    pub const ALL: [Gatt; 13] = [
        Self::LogService,
        Self::SensorsRtd,
        Self::SensorsLog,
        Self::CmdTx,
        Self::CmdRx,
        Self::CfgLogEnable,
        Self::CfgSensorEnable,
        Self::CfgInterval,
        Self::CfgRtImu,
        Self::DeviceInformation,
        Self::SerialNumber,
        Self::SoftwareRevision,
        Self::Manufacturer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::LogService => "log-service",
            Self::SensorsRtd => "sensors-rtd",
            Self::SensorsLog => "sensors-log",
            Self::CmdTx => "cmd-tx",
            Self::CmdRx => "cmd-rx",
            Self::CfgLogEnable => "cfg-log-enable",
            Self::CfgSensorEnable => "cfg-sensor-enable",
            Self::CfgInterval => "cfg-interval",
            Self::CfgRtImu => "cfg-rt-imu",
            Self::DeviceInformation => "device-information",
            Self::SerialNumber => "serial-number",
            Self::SoftwareRevision => "software-revision",
            Self::Manufacturer => "manufacturer",
        }
    }

    /// True for services, false for characteristics.
    pub fn is_service(self) -> bool {
        matches!(self, Self::LogService | Self::DeviceInformation)
    }

    pub fn uuid(self) -> String {
        match self {
            Self::LogService => vendor_uuid(0x0002),
            Self::SensorsRtd => vendor_uuid(0x0022),
            Self::SensorsLog => vendor_uuid(0x0021),
            Self::CmdTx => vendor_uuid(0x001A),
            Self::CmdRx => vendor_uuid(0x0023),
            Self::CfgLogEnable => vendor_uuid(0x0000),
            Self::CfgSensorEnable => vendor_uuid(0x0001),
            Self::CfgInterval => vendor_uuid(0x0002),
            Self::CfgRtImu => vendor_uuid(0x0003),
            Self::DeviceInformation => standard_uuid(0x180A),
            Self::SerialNumber => standard_uuid(0x2A25),
            Self::SoftwareRevision => standard_uuid(0x2A28),
            Self::Manufacturer => standard_uuid(0x2A29),
        }
    }
}

macro_rules! protocol_code {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident = $value:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        #[repr(u8)]
        pub enum $name {
            $($variant = $value,)+
        }

        impl TryFrom<u8> for $name {
            type Error = SchemaError;

            fn try_from(value: u8) -> Result<Self> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(SchemaError::UnknownCode { kind: $kind, value }),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(code: $name) -> u8 {
                code as u8
            }
        }
    };
}

protocol_code! {
    /// Command request opcodes.
    CommandOpcode, "command" {
        UpdateReadPtr = 0x00,
        BlinkLed = 0x01,
        EnterDfu = 0x02,
        CalibrateGyro = 0x03,
        CalibrateCompass = 0x04,
        CalibrateEnd = 0x05,
        SetPasscode = 0x06,
        GetPasscodeState = 0x07,
        SetDisableCalCorr = 0x08,
        GetDisableCalCorr = 0x09,
        CalClearTempLut = 0x0A,
        CalSetTempLutVal = 0x0B,
        CalSaveTempLut = 0x0C,
        UpdateGetMem = 0x70,
    }
}

protocol_code! {
    /// Command response codes.
    ResponseCode, "response" {
        Success = 0x00,
        Error = 0x01,
        ErrorPasscodeFormat = 0x02,
        ErrorCompassNoMotion = 0x03,
        ErrorCompassLargeMagnet = 0x04,
        ErrorAccessDenied = 0x05,
        ErrorUnknownCmd = 0x06,
        Complete = 0x80,
        ErrorCalibration = 0x81,
        Progress = 0x82,
    }
}

protocol_code! {
    /// Password protection state.
    PasscodeStatus, "passcode status" {
        Init = 0x00,
        Unverified = 0x01,
        Verified = 0x02,
        Disabled = 0x03,
    }
}

impl PasscodeStatus {
    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Unverified => "unverified",
            Self::Verified => "verified",
            Self::Disabled => "disabled",
        }
    }

    /// True when the device refuses commands until unlocked.
    pub fn needs_unlock(self) -> bool {
        self == Self::Unverified
    }
}

/// Encode a u32 configuration value as written to a characteristic.
pub fn encode_u32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Decode a u32 configuration characteristic value.
pub fn decode_u32(data: &[u8]) -> Result<u32> {
    let bytes: [u8; 4] = data.try_into().map_err(|_| SchemaError::InvalidLength {
        expected: 4,
        actual: data.len(),
    })?;
    Ok(u32::from_le_bytes(bytes))
}

/// Build a command write: opcode followed by its data.
pub fn encode_command(opcode: CommandOpcode, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + data.len());
    out.push(opcode.into());
    out.extend_from_slice(data);
    out
}

/// `SET_PASSCODE` command. Sets a new passcode on a device in `init` state,
/// unlocks a device in `unverified` state.
pub fn passcode_command(passcode: &str) -> Result<Vec<u8>> {
    if !passcode.is_ascii() || passcode.len() != PASSCODE_LEN {
        return Err(SchemaError::InvalidPasscode);
    }
    Ok(encode_command(CommandOpcode::SetPasscode, passcode.as_bytes()))
}

/// Check a command response against its request and return the response
/// data after the id byte.
pub fn parse_response(request: CommandOpcode, response: &[u8], expected_len: usize) -> Result<&[u8]> {
    if response.len() != expected_len || response.is_empty() {
        return Err(SchemaError::InvalidLength {
            expected: expected_len,
            actual: response.len(),
        });
    }
    let expected = u8::from(request) | RESPONSE_FLAG;
    if response[0] != expected {
        return Err(SchemaError::UnexpectedResponse {
            expected,
            actual: response[0],
        });
    }
    Ok(&response[1..])
}

/// Status of a response to a command that reports one.
///
/// Byte 1 is zero on success; one means byte 2 holds the [`ResponseCode`].
pub fn response_status(response: &[u8]) -> Result<ResponseCode> {
    match response {
        [_, 0x00, ..] => Ok(ResponseCode::Success),
        [_, 0x01, code, ..] => ResponseCode::try_from(*code),
        [_, 0x01] => Err(SchemaError::InvalidLength {
            expected: 3,
            actual: 2,
        }),
        [_, status, ..] => Err(SchemaError::UnknownCode {
            kind: "response status",
            value: *status,
        }),
        _ => Err(SchemaError::InvalidLength {
            expected: 2,
            actual: response.len(),
        }),
    }
}

/// Decode the response to `GET_PASSCODE_STATE`.
pub fn parse_passcode_status(response: &[u8]) -> Result<PasscodeStatus> {
    let data = parse_response(CommandOpcode::GetPasscodeState, response, 2)?;
    PasscodeStatus::try_from(data[0])
}

/// Pending change to the sensor enable bit field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskChange {
    set: u32,
    clear: u32,
}

impl MaskChange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn a sensor on or off, by its command line name.
    pub fn switch(&mut self, registry: &FieldRegistry, sensor: &str, on: bool) -> Result<()> {
        let field = registry.sensor(sensor)?;
        let mask = field.enable_mask().unwrap_or_default();
        if on {
            self.set |= mask;
        } else {
            self.clear |= mask;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.set == 0 && self.clear == 0
    }

    /// Apply to the current bit field. Enabling wins over disabling.
    pub fn apply(&self, current: u32) -> u32 {
        (current & !self.clear) | self.set
    }
}

/// One sensor's on/off state in a bit field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorState {
    pub name: &'static str,
    pub mask: u32,
    pub enabled: bool,
}

/// Expand a sensor enable bit field into per-sensor states.
pub fn sensor_states(registry: &FieldRegistry, bits: u32) -> Vec<SensorState> {
    registry
        .sensors()
        .filter_map(|field| {
            field.enable_mask().map(|mask| SensorState {
                name: field.api_name(),
                mask,
                enabled: bits & mask != 0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_match_device_layout() {
        assert_eq!(
            Gatt::LogService.uuid(),
            "c9f60002-9f9b-fba4-5847-7fd701bf59f2"
        );
        assert_eq!(Gatt::CmdTx.uuid(), "c9f6001a-9f9b-fba4-5847-7fd701bf59f2");
        assert_eq!(
            Gatt::SerialNumber.uuid(),
            "00002a25-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn codes_round_trip_through_u8() {
        assert_eq!(CommandOpcode::try_from(0x70).unwrap(), CommandOpcode::UpdateGetMem);
        assert_eq!(u8::from(ResponseCode::Progress), 0x82);
        assert!(matches!(
            PasscodeStatus::try_from(0x09),
            Err(SchemaError::UnknownCode { kind: "passcode status", value: 0x09 })
        ));
    }

    #[test]
    fn passcode_must_be_eight_ascii_chars() {
        let cmd = passcode_command("abcd1234").unwrap();
        assert_eq!(cmd[0], 0x06);
        assert_eq!(&cmd[1..], b"abcd1234");

        assert!(passcode_command("short").is_err());
        assert!(passcode_command("åbcd1234").is_err());
    }

    #[test]
    fn response_must_echo_opcode() {
        assert_eq!(
            parse_passcode_status(&[0x87, 0x02]).unwrap(),
            PasscodeStatus::Verified
        );
        assert!(matches!(
            parse_passcode_status(&[0x86, 0x02]),
            Err(SchemaError::UnexpectedResponse { expected: 0x87, actual: 0x86 })
        ));
        assert!(matches!(
            parse_passcode_status(&[0x87]),
            Err(SchemaError::InvalidLength { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn layout_names_are_unique() {
        let mut names: Vec<_> = Gatt::ALL.iter().map(|g| g.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Gatt::ALL.len());
        assert_eq!(Gatt::ALL.iter().filter(|g| g.is_service()).count(), 2);
    }

    #[test]
    fn status_follows_error_flag() {
        assert_eq!(response_status(&[0x83, 0x00]).unwrap(), ResponseCode::Success);
        assert_eq!(
            response_status(&[0x84, 0x01, 0x04]).unwrap(),
            ResponseCode::ErrorCompassLargeMagnet
        );
        assert!(matches!(
            response_status(&[0x83, 0x05]),
            Err(SchemaError::UnknownCode { kind: "response status", value: 0x05 })
        ));
        assert!(matches!(
            response_status(&[0x83, 0x01]),
            Err(SchemaError::InvalidLength { expected: 3, actual: 2 })
        ));
        assert!(response_status(&[0x83]).is_err());
    }

    #[test]
    fn u32_values_are_little_endian() {
        assert_eq!(encode_u32(0x0000_0211), [0x11, 0x02, 0x00, 0x00]);
        assert_eq!(decode_u32(&[0x3C, 0, 0, 0]).unwrap(), 60);
        assert!(decode_u32(&[1, 2, 3]).is_err());
    }

    #[test]
    fn mask_change_sets_and_clears() {
        let registry = FieldRegistry::new();
        let mut change = MaskChange::new();
        assert!(change.is_empty());

        change.switch(&registry, "temp", true).unwrap();
        change.switch(&registry, "pressure", false).unwrap();
        assert_eq!(change.apply(0x0001 | 0x0010), 0x0004 | 0x0010);

        assert!(change.switch(&registry, "TS", true).is_err());
    }

    #[test]
    fn states_list_every_sensor() {
        let registry = FieldRegistry::new();
        let states = sensor_states(&registry, 0x0004 | 0x0200);
        assert_eq!(states.len(), 9);
        let on: Vec<_> = states.iter().filter(|s| s.enabled).map(|s| s.name).collect();
        assert_eq!(on, ["temp", "batvolt"]);
    }
}
