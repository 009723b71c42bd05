//! Reassembly of log entry frames from BLE notification packets.
//!
//! A logger streams `[length][payload]` frames over a notification
//! characteristic. Notifications split frames at arbitrary points and some
//! stacks reorder them, so frames are rebuilt here from a [`PacketBuffer`]
//! by a [`FrameDecoder`], with [`ReorderRecovery`] retrying windows that fail
//! to decode under alternate packet orders.

pub mod buffer;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod history;
pub mod recovery;

pub use buffer::{PacketBuffer, PacketOrder, DEFAULT_BUFFER_CAPACITY};
pub use codec::{encode_frame, FrameConfig, MAX_PAYLOAD_SIZE};
pub use decoder::{DecodeOutcome, FrameDecoder};
pub use error::{FrameError, Result};
pub use history::{HistoryEntry, MessageHistory, DEFAULT_HISTORY_LEN};
pub use recovery::{RecoveryAction, RecoveryConfig, ReorderRecovery};
