use std::io::Write;

use mlr_lang::{Record, Value};

use super::RecordWriter;
use crate::error::Result;

/// Writes records as one JSON array, nested values preserved.
pub struct JsonWriter<W: Write> {
    sink: W,
    records_written: usize,
    finished: bool,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            records_written: 0,
            finished: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> RecordWriter for JsonWriter<W> {
    fn write_record(&mut self, record: &Record) -> Result<()> {
        let separator = if self.records_written == 0 { "[\n" } else { ",\n" };
        self.sink.write_all(separator.as_bytes())?;

        let object = serde_json::Value::Object(
            record
                .iter()
                .map(|(key, value)| (key.clone(), to_json(value)))
                .collect(),
        );
        serde_json::to_writer_pretty(&mut self.sink, &object)?;
        self.records_written += 1;
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.sink.write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if !self.finished {
            let trailer = if self.records_written == 0 { "[\n]\n" } else { "\n]\n" };
            self.sink.write_all(trailer.as_bytes())?;
            self.finished = true;
        }
        self.flush()
    }
}

pub(crate) fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Void => serde_json::Value::String(String::new()),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(value.to_string())),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), to_json(value)))
                .collect(),
        ),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Absent | Value::Error(_) => serde_json::Value::String(value.to_string()),
    }
}
