use std::sync::Arc;

use tracing::warn;

use crate::entry::{LogEntry, RawField};
use crate::error::{Result, SchemaError};
use crate::field::TIMESTAMP_FIELD;
use crate::registry::FieldRegistry;

/// A decoded log entry: raw readings keyed by display column, in message
/// order. Vector fields are already split into one column per axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorRecord {
    columns: Vec<String>,
    values: Vec<i64>,
}

impl SensorRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: i64) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<i64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|index| self.values[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// End of a log transfer is an entry holding a single field, which
    /// should be the timestamp. Any single-field entry counts.
    pub fn is_end_of_stream(&self, timestamp_column: &str) -> bool {
        if self.len() != 1 {
            return false;
        }
        if self.columns[0] != timestamp_column {
            warn!(columns = ?self.columns, "unexpected last message keys");
        }
        true
    }
}

/// Turns one frame payload into a [`SensorRecord`].
///
/// Implementations must be pure: the frame decoder may call `decode` on the
/// same window several times with different packet orderings.
pub trait RecordCodec {
    fn decode(&self, payload: &[u8]) -> Result<SensorRecord>;

    /// Column whose sole presence marks the end-of-stream record.
    fn timestamp_column(&self) -> &str;
}

/// [`RecordCodec`] for the protobuf [`LogEntry`] message.
#[derive(Debug, Clone)]
pub struct EntryCodec {
    registry: Arc<FieldRegistry>,
    timestamp_column: String,
}

impl EntryCodec {
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        let timestamp_column = registry
            .timestamp_column()
            .unwrap_or(TIMESTAMP_FIELD)
            .to_string();
        Self {
            registry,
            timestamp_column,
        }
    }

    pub fn registry(&self) -> &Arc<FieldRegistry> {
        &self.registry
    }

    /// Map the present fields of an entry to columns.
    pub fn columnize(&self, entry: &LogEntry) -> Result<SensorRecord> {
        if entry.timestamp.is_none() {
            return Err(SchemaError::MissingField(TIMESTAMP_FIELD));
        }

        let mut record = SensorRecord::new();
        for (name, value) in entry.present_fields() {
            let field = self.registry.field_for_protocol_name(name)?;
            match value {
                RawField::Scalar(value) => record.push(field.columns()[0].clone(), value),
                RawField::Vector(values) => {
                    let columns = field.columns();
                    if values.len() > columns.len() || !field.is_vector() {
                        return Err(SchemaError::TooManyValues {
                            field: name.to_string(),
                            count: values.len(),
                            axes: field.axes().len(),
                        });
                    }
                    for (column, value) in columns.iter().zip(values) {
                        record.push(column.clone(), i64::from(*value));
                    }
                }
            }
        }
        Ok(record)
    }
}

impl Default for EntryCodec {
    fn default() -> Self {
        Self::new(Arc::new(FieldRegistry::new()))
    }
}

impl RecordCodec for EntryCodec {
    fn decode(&self, payload: &[u8]) -> Result<SensorRecord> {
        let entry = LogEntry::decode_from_bytes(payload)?;
        self.columnize(&entry)
    }

    fn timestamp_column(&self) -> &str {
        &self.timestamp_column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FIELD_SPECS;

    fn sample_entry() -> LogEntry {
        LogEntry {
            timestamp: Some(1_600_000_000),
            temperature: Some(21_500),
            accelerometer: vec![16_384, 0, -16_384],
            ..LogEntry::default()
        }
    }

    #[test]
    fn decodes_into_columns() {
        let codec = EntryCodec::default();
        let record = codec.decode(&sample_entry().encode_to_bytes()).unwrap();

        assert_eq!(record.columns(), ["TS", "t", "a_x", "a_y", "a_z"]);
        assert_eq!(record.values(), [1_600_000_000, 21_500, 16_384, 0, -16_384]);
        assert_eq!(record.get("a_z"), Some(-16_384));
        assert!(!record.is_end_of_stream(codec.timestamp_column()));
    }

    #[test]
    fn timestamp_only_record_is_end_of_stream() {
        let codec = EntryCodec::default();
        let record = codec
            .decode(&LogEntry::end_of_log(7).encode_to_bytes())
            .unwrap();
        assert!(record.is_end_of_stream("TS"));
    }

    #[test]
    fn any_single_field_record_is_end_of_stream() {
        let mut record = SensorRecord::new();
        record.push("bat", 3000);
        assert!(record.is_end_of_stream("TS"));
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        let codec = EntryCodec::default();
        let entry = LogEntry {
            pressure: Some(1),
            ..LogEntry::default()
        };
        let err = codec.decode(&entry.encode_to_bytes()).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField("timestamp")));
        assert!(codec.decode(&[]).is_err());
    }

    #[test]
    fn extra_axis_is_rejected() {
        let codec = EntryCodec::default();
        let entry = LogEntry {
            timestamp: Some(1),
            gyro: vec![1, 2, 3, 4],
            ..LogEntry::default()
        };
        let err = codec.decode(&entry.encode_to_bytes()).unwrap_err();
        assert!(matches!(err, SchemaError::TooManyValues { count: 4, .. }));
        assert!(!err.is_schema_mismatch());
    }

    #[test]
    fn field_missing_from_registry_is_schema_mismatch() {
        let specs: Vec<_> = FIELD_SPECS
            .iter()
            .copied()
            .filter(|spec| spec.proto_name != "temperature")
            .collect();
        let registry = Arc::new(FieldRegistry::from_specs(&specs).unwrap());
        let codec = EntryCodec::new(registry);

        let err = codec.decode(&sample_entry().encode_to_bytes()).unwrap_err();
        assert!(matches!(&err, SchemaError::UnknownField(name) if name == "temperature"));
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = EntryCodec::default();
        let err = codec.decode(&[0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(_)));
    }
}
