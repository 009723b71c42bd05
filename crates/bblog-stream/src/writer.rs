//! Row writers for terminal, spreadsheet and machine consumption.

use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

use bblog_schema::FieldRegistry;
use serde::Serialize;

use crate::sink::{OutputSink, Value};

/// Width every text column is padded to.
pub const TXT_COLUMN_WIDTH: usize = 10;

/// Output encoding of decoded rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowFormat {
    /// Aligned columns with a name and unit header, set off from preceding
    /// terminal output by one blank line.
    #[default]
    Txt,
    /// Comma separated values, header row on every column change.
    Csv,
    /// One JSON array per line: column names on change, then values.
    Json,
}

impl RowFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Boxed writer for this format.
    pub fn writer<W>(self, registry: Arc<FieldRegistry>, out: W) -> Box<dyn OutputSink + Send>
    where
        W: Write + Send + 'static,
    {
        match self {
            Self::Txt => Box::new(TxtWriter::new(registry, out)),
            Self::Csv => Box::new(CsvWriter::new(out)),
            Self::Json => Box::new(JsonWriter::new(out)),
        }
    }
}

impl FromStr for RowFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "txt" => Ok(Self::Txt),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown row format '{other}' (expected txt, csv or json)")),
        }
    }
}

/// Fixed-width text for terminals.
pub struct TxtWriter<W> {
    registry: Arc<FieldRegistry>,
    out: W,
    headers: usize,
}

impl<W: Write> TxtWriter<W> {
    pub fn new(registry: Arc<FieldRegistry>, out: W) -> Self {
        Self {
            registry,
            out,
            headers: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header(&mut self, columns: &[String]) -> io::Result<()> {
        if self.headers == 0 {
            writeln!(self.out)?;
        }
        self.headers += 1;

        let mut names = String::new();
        let mut units = String::new();
        for column in columns {
            let unit = self
                .registry
                .field_for_column(column)
                .map(|field| field.unit())
                .unwrap_or_default();
            names.push_str(&pad(column));
            units.push_str(&pad(&format!("({unit})")));
        }
        writeln!(self.out, "{names}")?;
        writeln!(self.out, "{units}")
    }
}

impl<W: Write> OutputSink for TxtWriter<W> {
    fn write(&mut self, columns: &[String], values: &[Value], header_changed: bool) -> io::Result<()> {
        if header_changed {
            self.write_header(columns)?;
        }
        let mut line = String::new();
        for (column, value) in columns.iter().zip(values) {
            let text = match self.registry.field_for_column(column) {
                Ok(field) => field.format(value.as_f64()),
                Err(_) => value.to_string(),
            };
            line.push_str(&pad(&text));
        }
        writeln!(self.out, "{line}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

fn pad(text: &str) -> String {
    format!("{text:<width$}", width = TXT_COLUMN_WIDTH)
}

/// Comma separated values.
pub struct CsvWriter<W> {
    out: W,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputSink for CsvWriter<W> {
    fn write(&mut self, columns: &[String], values: &[Value], header_changed: bool) -> io::Result<()> {
        if header_changed {
            writeln!(self.out, "{}", columns.join(","))?;
        }
        let row: Vec<String> = values.iter().map(ToString::to_string).collect();
        writeln!(self.out, "{}", row.join(","))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// JSON lines.
pub struct JsonWriter<W> {
    out: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputSink for JsonWriter<W> {
    fn write(&mut self, columns: &[String], values: &[Value], header_changed: bool) -> io::Result<()> {
        if header_changed {
            serde_json::to_writer(&mut self.out, columns)?;
            writeln!(self.out)?;
        }
        serde_json::to_writer(&mut self.out, values)?;
        writeln!(self.out)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn txt_sets_off_first_header_only() {
        let mut writer = TxtWriter::new(Arc::new(FieldRegistry::new()), Vec::new());
        let cols = columns(&["TS", "t"]);
        writer
            .write(&cols, &[Value::Float(100.0), Value::Float(21.5)], true)
            .unwrap();
        writer
            .write(&cols, &[Value::Float(101.0), Value::Float(-1.25)], false)
            .unwrap();
        writer
            .write(&columns(&["TS"]), &[Value::Float(102.0)], true)
            .unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "TS        t         ");
        assert_eq!(lines[2], "(s)       (C)       ");
        assert_eq!(lines[3], "    100    21.500   ");
        assert_eq!(lines[4], "    101   -1.250    ");
        assert_eq!(lines[5], "TS        ");
        assert_eq!(lines[6], "(s)       ");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn csv_writes_header_on_change() {
        let mut writer = CsvWriter::new(Vec::new());
        let cols = columns(&["TS", "p"]);
        writer.write(&cols, &[Value::Int(1), Value::Int(101_325)], true).unwrap();
        writer.write(&cols, &[Value::Int(2), Value::Float(1013.25)], false).unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, "TS,p\n1,101325\n2,1013.25\n");
    }

    #[test]
    fn csv_keeps_decimal_point_on_whole_floats() {
        let mut writer = CsvWriter::new(Vec::new());
        let values = [Value::Float(100.0), Value::Float(-3.0), Value::Float(0.5)];
        writer.write(&columns(&["TS", "t", "l"]), &values, true).unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, "TS,t,l\n100.0,-3.0,0.5\n");
    }

    #[test]
    fn json_writes_one_array_per_line() {
        let mut writer = JsonWriter::new(Vec::new());
        writer
            .write(&columns(&["TS", "t"]), &[Value::Int(7), Value::Float(21.5)], true)
            .unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, "[\"TS\",\"t\"]\n[7,21.5]\n");
    }

    #[test]
    fn row_format_parses_names() {
        assert_eq!("csv".parse::<RowFormat>().unwrap(), RowFormat::Csv);
        assert!("xml".parse::<RowFormat>().is_err());
        assert_eq!(RowFormat::default().as_str(), "txt");
    }
}
