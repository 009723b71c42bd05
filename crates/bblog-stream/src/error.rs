use std::time::Duration;

use bblog_frame::FrameError;

/// Errors that end a decoding session.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Framing or record decoding failed beyond recovery.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The output sink rejected a row.
    #[error("output sink error: {0}")]
    Sink(#[source] std::io::Error),

    /// The session already failed; it accepts no more data.
    #[error("session closed after a fatal error")]
    Closed,

    /// The packet source went away before the end of the log.
    #[error("notification source disconnected")]
    Disconnected,

    /// The transfer was cancelled by the caller.
    #[error("transfer cancelled")]
    Cancelled,

    /// No notification arrived within the idle timeout.
    #[error("no data received for {0:?}")]
    Timeout(Duration),
}

impl StreamError {
    /// True for errors raised by the wire data itself, as opposed to the
    /// transport or the caller.
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::Frame(_))
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
