//! The `bb_log_entry` protobuf message sent by the logger, one per frame.

use prost::Message;

use crate::error::Result;
use crate::field::TIMESTAMP_FIELD;

/// One log entry as serialized by the device firmware.
///
/// Every field is optional on the wire; which ones are present depends on
/// the sensor enable mask (stored log) or the real-time mode.
#[derive(Clone, PartialEq, Message)]
pub struct LogEntry {
    #[prost(uint32, optional, tag = "1")]
    pub timestamp: Option<u32>,
    #[prost(uint32, optional, tag = "2")]
    pub pressure: Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub rh: Option<u32>,
    #[prost(sint32, optional, tag = "4")]
    pub temperature: Option<i32>,
    #[prost(sint32, repeated, tag = "5")]
    pub compass: Vec<i32>,
    #[prost(sint32, repeated, tag = "6")]
    pub accelerometer: Vec<i32>,
    #[prost(sint32, repeated, tag = "7")]
    pub gyro: Vec<i32>,
    #[prost(uint32, optional, tag = "8")]
    pub lux: Option<u32>,
    #[prost(uint32, optional, tag = "9")]
    pub uvi: Option<u32>,
    #[prost(uint32, optional, tag = "10")]
    pub battery_mv: Option<u32>,
    #[prost(uint32, optional, tag = "11")]
    pub gpio0_mv: Option<u32>,
    #[prost(uint32, optional, tag = "12")]
    pub gpio1_mv: Option<u32>,
    #[prost(uint32, optional, tag = "13")]
    pub int_gpio0: Option<u32>,
    #[prost(uint32, optional, tag = "14")]
    pub int_gpio1: Option<u32>,
    #[prost(uint32, optional, tag = "15")]
    pub int_acc: Option<u32>,
}

/// Value of one present field, borrowed from a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawField<'a> {
    Scalar(i64),
    Vector(&'a [i32]),
}

impl LogEntry {
    /// The entry a device sends last: nothing but a timestamp.
    pub fn end_of_log(timestamp: u32) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..Self::default()
        }
    }

    /// Decode an entry from a frame payload.
    pub fn decode_from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::decode(bytes)?)
    }

    /// Serialize the entry into a frame payload.
    pub fn encode_to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Present fields in message order, keyed by protocol field name.
    ///
    /// Empty repeated fields count as absent.
    pub fn present_fields(&self) -> Vec<(&'static str, RawField<'_>)> {
        let mut out = Vec::with_capacity(16);

        fn scalar<T: Into<i64>>(
            out: &mut Vec<(&'static str, RawField<'_>)>,
            name: &'static str,
            value: Option<T>,
        ) {
            if let Some(value) = value {
                out.push((name, RawField::Scalar(value.into())));
            }
        }

        fn vector<'a>(
            out: &mut Vec<(&'static str, RawField<'a>)>,
            name: &'static str,
            values: &'a [i32],
        ) {
            if !values.is_empty() {
                out.push((name, RawField::Vector(values)));
            }
        }

        scalar(&mut out, TIMESTAMP_FIELD, self.timestamp);
        scalar(&mut out, "pressure", self.pressure);
        scalar(&mut out, "rh", self.rh);
        scalar(&mut out, "temperature", self.temperature);
        vector(&mut out, "compass", &self.compass);
        vector(&mut out, "accelerometer", &self.accelerometer);
        vector(&mut out, "gyro", &self.gyro);
        scalar(&mut out, "lux", self.lux);
        scalar(&mut out, "uvi", self.uvi);
        scalar(&mut out, "battery_mv", self.battery_mv);
        scalar(&mut out, "gpio0_mv", self.gpio0_mv);
        scalar(&mut out, "gpio1_mv", self.gpio1_mv);
        scalar(&mut out, "int_gpio0", self.int_gpio0);
        scalar(&mut out, "int_gpio1", self.int_gpio1);
        scalar(&mut out, "int_acc", self.int_acc);

        out
    }
}
