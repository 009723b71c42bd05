//! Decoding of BlueBerry environmental logger data streams.
//!
//! The logger sends its stored or real-time log over BLE notifications as a
//! stream of length-prefixed protobuf entries. This crate bundles the pieces
//! that turn those notifications into sensor rows.
//!
//! # Crate Structure
//!
//! - [`schema`]: field registry, log entry message and device protocol codes
//! - [`frame`]: packet buffering, frame decoding and reorder recovery
//! - [`stream`]: decoding sessions, output sinks and row writers

/// Re-export schema types.
pub mod schema {
    pub use bblog_schema::*;
}

/// Re-export frame types.
pub mod frame {
    pub use bblog_frame::*;
}

/// Re-export session types.
pub mod stream {
    pub use bblog_stream::*;
}
