use std::collections::HashMap;

use crate::error::{Result, SchemaError};
use crate::field::{FieldDescriptor, FieldSpec, FIELD_SPECS, TIMESTAMP_FIELD};

/// Lookup tables over the log entry fields.
///
/// Built once at startup and shared read-only (usually behind an `Arc`)
/// between the record codec, the stream session and the output writers.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<FieldDescriptor>,
    by_proto: HashMap<&'static str, usize>,
    by_column: HashMap<String, usize>,
    by_api: HashMap<&'static str, usize>,
}

impl FieldRegistry {
    /// Registry of the built-in BlueBerry log entry fields.
    pub fn new() -> Self {
        Self::build(FIELD_SPECS)
    }

    /// Build a registry from an explicit field list.
    ///
    /// Fails if two specs share a protocol name, alias or column.
    pub fn from_specs(specs: &[FieldSpec]) -> Result<Self> {
        let registry = Self::build(specs);
        if registry.by_proto.len() != registry.fields.len() {
            return Err(SchemaError::Duplicate(first_duplicate(
                specs.iter().map(|s| s.proto_name.to_string()),
            )));
        }
        let column_count: usize = registry.fields.iter().map(|f| f.columns().len()).sum();
        if registry.by_column.len() != column_count {
            return Err(SchemaError::Duplicate(first_duplicate(
                registry.fields.iter().flat_map(|f| f.columns().iter().cloned()),
            )));
        }
        if registry.by_api.len() != registry.fields.len() {
            return Err(SchemaError::Duplicate(first_duplicate(
                registry.fields.iter().map(|f| f.api_name().to_string()),
            )));
        }
        Ok(registry)
    }

    fn build(specs: &[FieldSpec]) -> Self {
        let fields: Vec<FieldDescriptor> = specs.iter().copied().map(FieldDescriptor::new).collect();
        let mut by_proto = HashMap::with_capacity(fields.len());
        let mut by_column = HashMap::with_capacity(fields.len());
        let mut by_api = HashMap::with_capacity(fields.len());

        for (index, field) in fields.iter().enumerate() {
            by_proto.insert(field.proto_name(), index);
            by_api.insert(field.api_name(), index);
            for column in field.columns() {
                by_column.insert(column.clone(), index);
            }
        }

        Self {
            fields,
            by_proto,
            by_column,
            by_api,
        }
    }

    pub fn field_for_protocol_name(&self, name: &str) -> Result<&FieldDescriptor> {
        self.by_proto
            .get(name)
            .map(|&index| &self.fields[index])
            .ok_or_else(|| SchemaError::UnknownField(name.to_string()))
    }

    pub fn field_for_column(&self, column: &str) -> Result<&FieldDescriptor> {
        self.by_column
            .get(column)
            .map(|&index| &self.fields[index])
            .ok_or_else(|| SchemaError::UnknownColumn(column.to_string()))
    }

    /// Look up a configurable sensor by its command line name.
    pub fn sensor(&self, api_name: &str) -> Result<&FieldDescriptor> {
        self.by_api
            .get(api_name)
            .map(|&index| &self.fields[index])
            .filter(|field| field.is_configurable())
            .ok_or_else(|| SchemaError::UnknownSensor(api_name.to_string()))
    }

    /// Convert a raw reading of `column` to its physical unit.
    pub fn to_physical_unit(&self, column: &str, raw: f64) -> Result<f64> {
        Ok(self.field_for_column(column)?.to_physical_unit(raw))
    }

    /// Column of the timestamp field, if the registry has one.
    pub fn timestamp_column(&self) -> Option<&str> {
        self.by_proto
            .get(TIMESTAMP_FIELD)
            .and_then(|&index| self.fields[index].columns().first())
            .map(String::as_str)
    }

    /// All fields in message order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    /// Fields that have their own bit in the sensor enable mask.
    pub fn sensors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.is_configurable())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn first_duplicate(names: impl Iterator<Item = String>) -> String {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name.clone()) {
            return name;
        }
    }
    String::new()
}
