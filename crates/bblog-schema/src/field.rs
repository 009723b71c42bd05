//! Static descriptions of every value a log entry can carry.

use serde::Serialize;

/// Protocol name of the timestamp field. A record holding only this field
/// marks the end of a log transfer.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Conversion from a raw reading to its physical unit.
pub type ToUnit = fn(f64) -> f64;

/// Fixed-point text rendering for one column.
///
/// Mirrors a `"{: W.Pf}"` format: non-negative values get a leading space
/// so that columns of mixed sign stay aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextFormat {
    pub width: usize,
    pub precision: usize,
}

impl TextFormat {
    pub const fn new(width: usize, precision: usize) -> Self {
        Self { width, precision }
    }

    pub fn format(&self, value: f64) -> String {
        let body = format!("{:.*}", self.precision, value);
        let body = if value.is_sign_negative() {
            body
        } else {
            format!(" {body}")
        };
        format!("{body:>width$}", width = self.width)
    }
}

impl Default for TextFormat {
    fn default() -> Self {
        Self::new(4, 3)
    }
}

/// Compile-time description of a log entry field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Bit in the sensor enable characteristic, `None` if the field cannot
    /// be switched on and off on its own.
    pub enable_mask: Option<u32>,
    /// Field name in the log entry message.
    pub proto_name: &'static str,
    /// SI symbol or similar short identifier, used as the column name.
    pub symbol: &'static str,
    pub unit: &'static str,
    /// Friendlier name used on the command line and in configuration.
    pub alias: Option<&'static str>,
    /// Axis names of a vector field; empty for scalars.
    pub axes: &'static [&'static str],
    pub to_unit: ToUnit,
    pub text_format: TextFormat,
}

impl FieldSpec {
    const fn scalar(proto_name: &'static str, symbol: &'static str, unit: &'static str) -> Self {
        Self {
            enable_mask: None,
            proto_name,
            symbol,
            unit,
            alias: None,
            axes: &[],
            to_unit: identity,
            text_format: TextFormat::new(4, 3),
        }
    }

    const fn sensor(mut self, mask: u32) -> Self {
        self.enable_mask = Some(mask);
        self
    }

    const fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    const fn axes(mut self, axes: &'static [&'static str]) -> Self {
        self.axes = axes;
        self
    }

    const fn to_unit(mut self, to_unit: ToUnit) -> Self {
        self.to_unit = to_unit;
        self
    }

    const fn text_format(mut self, text_format: TextFormat) -> Self {
        self.text_format = text_format;
        self
    }
}

const XYZ: &[&str] = &["x", "y", "z"];

fn identity(x: f64) -> f64 {
    x
}

fn centi(x: f64) -> f64 {
    x / 100.0
}

fn deci(x: f64) -> f64 {
    x / 10.0
}

fn milli(x: f64) -> f64 {
    x / 1000.0
}

fn compass_ut(x: f64) -> f64 {
    x * 4915.0 / 32768.0
}

fn accel_ms2(x: f64) -> f64 {
    x * 2.0 * 9.81 / 32768.0
}

fn gyro_dps(x: f64) -> f64 {
    x * 250.0 / 32768.0
}

/// Every field of the BlueBerry log entry, in message order.
pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec::scalar("pressure", "p", "hPa")
        .sensor(0x0001)
        .to_unit(centi),
    FieldSpec::scalar("rh", "rh", "%")
        .sensor(0x0002)
        .alias("humid")
        .to_unit(deci),
    FieldSpec::scalar("temperature", "t", "C")
        .sensor(0x0004)
        .alias("temp")
        .to_unit(milli),
    FieldSpec::scalar("compass", "m", "uT")
        .sensor(0x0008)
        .axes(XYZ)
        .to_unit(compass_ut),
    FieldSpec::scalar("accelerometer", "a", "m/s^2")
        .sensor(0x0010)
        .alias("accel")
        .axes(XYZ)
        .to_unit(accel_ms2),
    FieldSpec::scalar("gyro", "g", "dps")
        .sensor(0x0020)
        .axes(XYZ)
        .to_unit(gyro_dps),
    FieldSpec::scalar("lux", "L", "lux")
        .sensor(0x0040)
        .to_unit(milli),
    FieldSpec::scalar("uvi", "UVi", "")
        .sensor(0x0100)
        .to_unit(milli),
    FieldSpec::scalar("battery_mv", "bat", "V")
        .sensor(0x0200)
        .alias("batvolt")
        .to_unit(milli),
    // Not sensors, but described the same way.
    FieldSpec::scalar(TIMESTAMP_FIELD, "TS", "s").text_format(TextFormat::new(7, 0)),
    FieldSpec::scalar("gpio0_mv", "gp0", "mV"),
    FieldSpec::scalar("gpio1_mv", "gp1", "mV"),
    FieldSpec::scalar("int_gpio0", "int0", ""),
    FieldSpec::scalar("int_gpio1", "int1", ""),
    FieldSpec::scalar("int_acc", "iacc1", ""),
];

/// A [`FieldSpec`] with its display columns resolved.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    spec: FieldSpec,
    columns: Vec<String>,
}

impl FieldDescriptor {
    pub fn new(spec: FieldSpec) -> Self {
        let columns = if spec.axes.is_empty() {
            vec![spec.symbol.to_string()]
        } else {
            spec.axes
                .iter()
                .map(|axis| format!("{}_{}", spec.symbol, axis))
                .collect()
        };
        Self { spec, columns }
    }

    pub fn proto_name(&self) -> &'static str {
        self.spec.proto_name
    }

    /// Name used on the command line: the alias if there is one.
    pub fn api_name(&self) -> &'static str {
        self.spec.alias.unwrap_or(self.spec.proto_name)
    }

    pub fn symbol(&self) -> &'static str {
        self.spec.symbol
    }

    pub fn unit(&self) -> &'static str {
        self.spec.unit
    }

    pub fn enable_mask(&self) -> Option<u32> {
        self.spec.enable_mask
    }

    /// True for sensors that have their own enable bit.
    pub fn is_configurable(&self) -> bool {
        self.spec.enable_mask.is_some()
    }

    pub fn axes(&self) -> &'static [&'static str] {
        self.spec.axes
    }

    pub fn is_vector(&self) -> bool {
        !self.spec.axes.is_empty()
    }

    /// One column per axis for vector fields, otherwise just the symbol.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn text_format(&self) -> TextFormat {
        self.spec.text_format
    }

    pub fn to_physical_unit(&self, raw: f64) -> f64 {
        (self.spec.to_unit)(raw)
    }

    pub fn format(&self, value: f64) -> String {
        self.spec.text_format.format(value)
    }
}
