use bblog_frame::{FrameConfig, RecoveryConfig, DEFAULT_BUFFER_CAPACITY, DEFAULT_HISTORY_LEN};

/// Settings for one [`SensorStreamSession`](crate::SensorStreamSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Write raw device readings instead of physical units.
    pub raw: bool,
    /// Stop after this many entries even without an end-of-log record.
    pub max_entries: Option<usize>,
    /// Packets buffered before the transfer fails.
    pub buffer_capacity: usize,
    /// Frames kept for the diagnostic dump.
    pub history_len: usize,
    /// Packet orders tried when a frame fails to decode.
    pub recovery: RecoveryConfig,
}

impl SessionConfig {
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            buffer_capacity: self.buffer_capacity,
            history_len: self.history_len,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            raw: false,
            max_entries: None,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            history_len: DEFAULT_HISTORY_LEN,
            recovery: RecoveryConfig::default(),
        }
    }
}
