use std::fmt;
use std::io;

use serde::Serialize;

/// One output value: a raw reading or a converted physical quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Receives decoded rows, one call per log entry.
pub trait OutputSink {
    /// `header_changed` is true for the first row and whenever `columns`
    /// differs from the previous row.
    fn write(&mut self, columns: &[String], values: &[Value], header_changed: bool) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn write(&mut self, columns: &[String], values: &[Value], header_changed: bool) -> io::Result<()> {
        (**self).write(columns, values, header_changed)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// A row collected by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub columns: Vec<String>,
    pub values: Vec<Value>,
    #[serde(skip)]
    pub header_changed: bool,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|index| self.values[index])
    }
}

/// Collects rows in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    rows: Vec<Row>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, columns: &[String], values: &[Value], header_changed: bool) -> io::Result<()> {
        self.rows.push(Row {
            columns: columns.to_vec(),
            values: values.to_vec(),
            header_changed,
        });
        Ok(())
    }
}
