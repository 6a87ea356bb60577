use std::io::Write;

use mlr_lang::Record;

use super::{RecordWriter, flatten};
use crate::error::{Error, Result};

/// Delimited-text writer. When the set of keys changes between records, a
/// blank line and a new header start a fresh block.
pub struct CsvWriter<W: Write> {
    writer: ::csv::Writer<W>,
    header: Option<Vec<String>>,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(sink: W, delimiter: u8) -> Self {
        Self {
            writer: ::csv::WriterBuilder::new()
                .delimiter(delimiter)
                .has_headers(false)
                .from_writer(sink),
            header: None,
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| Error::Write(err.into_error()))
    }
}

impl<W: Write> RecordWriter for CsvWriter<W> {
    fn write_record(&mut self, record: &Record) -> Result<()> {
        if record.is_empty() {
            return Ok(());
        }

        let (keys, values): (Vec<_>, Vec<_>) = flatten(record).into_iter().unzip();
        if self.header.as_ref() != Some(&keys) {
            if self.header.is_some() {
                self.writer.flush()?;
                self.writer.get_mut().write_all(b"\n")?;
            }
            self.writer.write_record(&keys)?;
            self.header = Some(keys);
        }
        self.writer.write_record(&values)?;
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_mut().write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()
    }
}
