/// Errors raised by the field registry, the record codec and the device
/// protocol helpers.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The payload is not a valid serialized log entry.
    #[error("malformed log entry: {0}")]
    Malformed(#[from] prost::DecodeError),

    /// A field the record cannot exist without was absent.
    #[error("log entry is missing required field '{0}'")]
    MissingField(&'static str),

    /// A vector field carried more values than it has axes.
    #[error("field '{field}' has {count} values but only {axes} axes")]
    TooManyValues {
        field: String,
        count: usize,
        axes: usize,
    },

    /// The payload names a protocol field the registry does not know.
    #[error("unknown protocol field '{0}' (firmware schema mismatch?)")]
    UnknownField(String),

    /// No field owns the given display column.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// No configurable sensor has the given name.
    #[error("unknown sensor '{0}'")]
    UnknownSensor(String),

    /// Two field specs claim the same protocol name or column.
    #[error("duplicate field or column '{0}' in registry")]
    Duplicate(String),

    /// The passcode is not exactly eight ASCII characters.
    #[error("password must be 8 chars and ascii only")]
    InvalidPasscode,

    /// A characteristic value or command response has the wrong size.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// A command response does not echo the request opcode.
    #[error("unexpected command id in response (expected 0x{expected:02X}, got 0x{actual:02X})")]
    UnexpectedResponse { expected: u8, actual: u8 },

    /// A numeric protocol code has no known meaning.
    #[error("unknown {kind} code 0x{value:02X}")]
    UnknownCode { kind: &'static str, value: u8 },
}

impl SchemaError {
    /// True when the error means this program and the device firmware
    /// disagree on the record schema. Such errors are never retried.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::UnknownField(_) | Self::UnknownColumn(_))
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
