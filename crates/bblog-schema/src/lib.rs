//! Log entry schema of the BlueBerry environmental logger.
//!
//! - [`FieldRegistry`]: every field the device can report, with display
//!   columns, units and raw-to-physical conversions.
//! - [`LogEntry`] / [`EntryCodec`]: the protobuf record carried in each
//!   frame and its mapping to a column-keyed [`SensorRecord`].
//! - [`device`]: GATT layout, command codes and configuration values.

pub mod device;
pub mod entry;
pub mod error;
pub mod field;
pub mod record;
pub mod registry;

pub use entry::{LogEntry, RawField};
pub use error::{Result, SchemaError};
pub use field::{FieldDescriptor, FieldSpec, TextFormat, FIELD_SPECS, TIMESTAMP_FIELD};
pub use record::{EntryCodec, RecordCodec, SensorRecord};
pub use registry::FieldRegistry;
