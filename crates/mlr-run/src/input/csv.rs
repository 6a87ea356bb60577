use std::io::Read;

use mlr_lang::{Context, Record, Value};

use super::Batcher;
use crate::error::{Error, Result};

/// Reads delimited text with a header line. Field values are type-inferred.
pub(super) fn read(
    source: impl Read,
    delimiter: u8,
    filename: &str,
    context: &mut Context,
    batcher: &mut Batcher,
) -> Result<()> {
    let csv_error = |source| Error::Csv {
        filename: filename.to_string(),
        source,
    };

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(source);
    let header = reader.headers().map_err(csv_error)?.clone();

    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let record: Record = header
            .iter()
            .zip(row.iter())
            .map(|(key, value)| (key, Value::infer(value)))
            .collect();

        context.update_for_input_record();
        if !batcher.push(record, context) {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::{Receiver, bounded, unbounded};
    use rstest::rstest;

    use super::*;
    use crate::input::{ReaderMessage, RecordAndContext};

    fn read_all(content: &str, delimiter: u8) -> (Result<()>, Vec<RecordAndContext>) {
        let (tx, rx) = unbounded();
        let (_done_tx, done_rx) = bounded(1);
        let mut context = Context::new();
        context.update_for_start_of_file("test.csv");

        let mut batcher = Batcher::new(&tx, &done_rx, 1000);
        let result = read(content.as_bytes(), delimiter, "test.csv", &mut context, &mut batcher);
        batcher.flush();
        drop(tx);
        (result, records(rx))
    }

    fn records(rx: Receiver<ReaderMessage>) -> Vec<RecordAndContext> {
        rx.iter()
            .flat_map(|message| match message {
                ReaderMessage::Batch(batch) => batch,
                _ => Vec::new(),
            })
            .collect()
    }

    #[rstest]
    #[case::comma("a,b,c\n1,x,2.5\n", b',')]
    #[case::tab("a\tb\tc\n1\tx\t2.5\n", b'\t')]
    fn test_read_infers_types(#[case] content: &str, #[case] delimiter: u8) {
        let (result, records) = read_all(content, delimiter);
        assert!(result.is_ok());

        let expected: Record = vec![
            ("a", Value::Int(1)),
            ("b", Value::from("x")),
            ("c", Value::Float(2.5)),
        ]
        .into_iter()
        .collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record, expected);
        assert_eq!(records[0].context.nr, 1);
    }

    #[test]
    fn test_read_empty_field_is_void() {
        let (_, records) = read_all("a,b\n,1\n", b',');
        assert_eq!(records[0].record.get("a"), Some(&Value::Void));
    }

    #[test]
    fn test_read_header_only() {
        let (result, records) = read_all("a,b\n", b',');
        assert!(result.is_ok());
        assert!(records.is_empty());
    }

    #[test]
    fn test_read_ragged_line_is_error() {
        let (result, records) = read_all("a,b\n1,2\n3\n", b',');
        assert!(matches!(result, Err(Error::Csv { .. })));
        assert_eq!(records.len(), 1);
    }
}
