//! Record writers.

mod csv;
mod json;

use std::io::Write;

use mlr_lang::{Record, Value};

pub use self::csv::CsvWriter;
pub use self::json::JsonWriter;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

/// Separator between the key segments of flattened nested fields.
pub const FLATTEN_SEPARATOR: &str = ".";

pub trait RecordWriter {
    fn write_record(&mut self, record: &Record) -> Result<()>;

    /// Writes `print` output in line with the records around it.
    fn write_text(&mut self, text: &str) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    /// Writes any trailer the format needs and flushes.
    fn finish(&mut self) -> Result<()>;
}

pub fn writer_for(
    format: OutputFormat,
    sink: Box<dyn Write + Send>,
) -> Box<dyn RecordWriter + Send> {
    match format {
        OutputFormat::Csv => Box::new(CsvWriter::new(sink, b',')),
        OutputFormat::Tsv => Box::new(CsvWriter::new(sink, b'\t')),
        OutputFormat::Json => Box::new(JsonWriter::new(sink)),
    }
}

/// Flattens nested maps and arrays into `key.subkey` fields for formats
/// that hold only scalars. Empty collections are written as `{}` and `[]`.
pub fn flatten(record: &Record) -> Vec<(String, String)> {
    let mut fields = Vec::with_capacity(record.len());
    for (key, value) in record.iter() {
        flatten_into(key.clone(), value, &mut fields);
    }
    fields
}

fn flatten_into(prefix: String, value: &Value, fields: &mut Vec<(String, String)>) {
    match value {
        Value::Map(map) if !map.is_empty() => {
            for (key, value) in map {
                flatten_into(format!("{prefix}{FLATTEN_SEPARATOR}{key}"), value, fields);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, value) in items.iter().enumerate() {
                flatten_into(format!("{prefix}{FLATTEN_SEPARATOR}{}", i + 1), value, fields);
            }
        }
        Value::Map(_) => fields.push((prefix, "{}".to_string())),
        Value::Array(_) => fields.push((prefix, "[]".to_string())),
        other => fields.push((prefix, other.to_text().into_owned())),
    }
}
