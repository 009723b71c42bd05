use bblog_schema::SchemaError;

/// Errors that end frame decoding. All of them are fatal for a transfer.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A frame announced a zero-byte payload.
    #[error("zero-length frame")]
    ZeroLengthFrame,

    /// Packets arrived faster than frames were decoded.
    #[error("packet buffer full ({capacity} packets)")]
    BufferFull { capacity: usize },

    /// More bytes were requested than are buffered.
    #[error("end of packet buffer ({requested} bytes requested, {available} available)")]
    EndOfBuffer { requested: usize, available: usize },

    /// The payload does not fit behind a one-byte length prefix.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A packet order is not a permutation of `0..n`.
    #[error("invalid packet order {0:?}")]
    InvalidOrder(Vec<usize>),

    /// The payload uses fields this program does not know about.
    #[error("record schema mismatch: {0}")]
    Schema(#[source] SchemaError),

    /// A frame kept failing to decode under every packet ordering.
    #[error("unrecoverable corrupt frame after {attempts} attempts: {source}")]
    Unrecoverable {
        attempts: usize,
        #[source]
        source: SchemaError,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
