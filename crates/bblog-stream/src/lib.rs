//! Log transfer sessions for the BlueBerry logger.
//!
//! A [`SensorStreamSession`] owns the frame decoder of one fetch. The
//! transport feeds it notification payloads; decoded entries come out as
//! rows through an [`OutputSink`], converted to physical units unless raw
//! output is requested.
//!
//! ```no_run
//! use std::sync::Arc;
//! use bblog_schema::FieldRegistry;
//! use bblog_stream::{MemorySink, SensorStreamSession, SessionConfig, SessionState};
//!
//! let registry = Arc::new(FieldRegistry::new());
//! let mut session = SensorStreamSession::new(SessionConfig::default(), registry, MemorySink::new());
//! # let notifications: Vec<bytes::Bytes> = Vec::new();
//! for packet in notifications {
//!     if let SessionState::Complete { entries } = session.feed(packet)? {
//!         println!("{entries} entries");
//!         break;
//!     }
//! }
//! # Ok::<(), bblog_stream::StreamError>(())
//! ```

pub mod config;
pub mod diagnostics;
#[cfg(feature = "async")]
pub mod driver;
pub mod error;
pub mod session;
pub mod sink;
pub mod writer;

pub use config::SessionConfig;
pub use diagnostics::{DiagnosticReport, Diagnostics, NoDiagnostics, TracingDiagnostics};
#[cfg(feature = "async")]
pub use driver::drive;
pub use error::{Result, StreamError};
pub use session::{SensorStreamSession, SessionState};
pub use sink::{MemorySink, OutputSink, Row, Value};
pub use writer::{CsvWriter, JsonWriter, RowFormat, TxtWriter};
