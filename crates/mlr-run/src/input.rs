//! Record readers.
//!
//! A [`Reader`] runs on its own thread. It parses every input source in
//! order, keeps the stream [`Context`] current, and ships records to the
//! evaluator in batches over a bounded channel. Between batches it checks a
//! downstream "done" channel so that a consumer which needs only a prefix of
//! the stream can stop it early. Whatever happens, the last message it sends
//! is [`ReaderMessage::EndOfStream`].

mod csv;
mod json;

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::PathBuf,
};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use mlr_lang::{Context, Record};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub const DEFAULT_RECORDS_PER_BATCH: usize = 500;

const STDIN_FILENAME: &str = "(stdin)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl InputFormat {
    /// Guesses the format from a file extension, defaulting to CSV.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path
            .extension()
            .unwrap_or_default()
            .to_string_lossy()
            .to_lowercase()
            .as_str()
        {
            "tsv" | "tab" => InputFormat::Tsv,
            "json" | "jsonl" => InputFormat::Json,
            _ => InputFormat::Csv,
        }
    }
}

/// A record together with the stream position it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordAndContext {
    pub record: Record,
    pub context: Context,
}

#[derive(Debug)]
pub enum ReaderMessage {
    Batch(Vec<RecordAndContext>),
    Error(Error),
    /// Always the last message; carries the final stream position for `end`
    /// blocks.
    EndOfStream(Context),
}

#[derive(Debug, Clone)]
pub struct Reader {
    format: InputFormat,
    /// Files to read in order; empty means standard input.
    files: Vec<PathBuf>,
    records_per_batch: usize,
}

impl Reader {
    pub fn new(format: InputFormat, files: Vec<PathBuf>) -> Self {
        Self {
            format,
            files,
            records_per_batch: DEFAULT_RECORDS_PER_BATCH,
        }
    }

    pub fn with_records_per_batch(mut self, records_per_batch: usize) -> Self {
        self.records_per_batch = records_per_batch.max(1);
        self
    }

    /// Reads every source to completion, to the first error, or until
    /// `done` is signaled or hung up, then sends end-of-stream.
    pub fn run(self, tx: Sender<ReaderMessage>, done: Receiver<()>) {
        let mut context = Context::new();
        let mut batcher = Batcher::new(&tx, &done, self.records_per_batch);

        match self.read_all(&mut context, &mut batcher) {
            Ok(()) => {
                batcher.flush();
                info!(records = context.nr, "end of input");
            }
            Err(err) => {
                batcher.flush();
                let _ = tx.send(ReaderMessage::Error(err));
            }
        }
        if batcher.cancelled {
            warn!(records = context.nr, "reader cancelled by downstream");
        }

        let _ = tx.send(ReaderMessage::EndOfStream(context));
    }

    fn read_all(&self, context: &mut Context, batcher: &mut Batcher) -> Result<()> {
        if self.files.is_empty() {
            context.update_for_start_of_file(STDIN_FILENAME);
            return self.read_source(Box::new(io::stdin()), STDIN_FILENAME, context, batcher);
        }

        for path in &self.files {
            if batcher.is_cancelled() {
                break;
            }
            let file = File::open(path).map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?;
            let filename = path.to_string_lossy();
            debug!(filename = %filename, "opening input");
            context.update_for_start_of_file(filename.as_ref());
            self.read_source(Box::new(file), &filename, context, batcher)?;
        }
        Ok(())
    }

    fn read_source(
        &self,
        source: Box<dyn Read>,
        filename: &str,
        context: &mut Context,
        batcher: &mut Batcher,
    ) -> Result<()> {
        let source = BufReader::new(source);
        match self.format {
            InputFormat::Csv => csv::read(source, b',', filename, context, batcher),
            InputFormat::Tsv => csv::read(source, b'\t', filename, context, batcher),
            InputFormat::Json => json::read(source, filename, context, batcher),
        }
    }
}

/// Accumulates records and sends them downstream a batch at a time.
struct Batcher<'a> {
    tx: &'a Sender<ReaderMessage>,
    done: &'a Receiver<()>,
    batch: Vec<RecordAndContext>,
    records_per_batch: usize,
    cancelled: bool,
}

impl<'a> Batcher<'a> {
    fn new(tx: &'a Sender<ReaderMessage>, done: &'a Receiver<()>, records_per_batch: usize) -> Self {
        Self {
            tx,
            done,
            batch: Vec::with_capacity(records_per_batch),
            records_per_batch,
            cancelled: false,
        }
    }

    /// Queues one record. Returns false once the reader should stop.
    fn push(&mut self, record: Record, context: &Context) -> bool {
        self.batch.push(RecordAndContext {
            record,
            context: context.clone(),
        });
        if self.batch.len() >= self.records_per_batch {
            return self.flush();
        }
        true
    }

    fn flush(&mut self) -> bool {
        if self.is_cancelled() {
            self.batch.clear();
            return false;
        }
        if self.batch.is_empty() {
            return true;
        }

        let batch = std::mem::replace(&mut self.batch, Vec::with_capacity(self.records_per_batch));
        if self.tx.send(ReaderMessage::Batch(batch)).is_err() {
            self.cancelled = true;
        }
        !self.cancelled
    }

    fn is_cancelled(&mut self) -> bool {
        if !self.cancelled {
            self.cancelled = matches!(
                self.done.try_recv(),
                Ok(()) | Err(TryRecvError::Disconnected)
            );
        }
        self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crossbeam_channel::{bounded, unbounded};
    use mlr_lang::Value;
    use tempfile::NamedTempFile;

    use super::*;

    fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn collect(rx: Receiver<ReaderMessage>) -> (Vec<Vec<RecordAndContext>>, Vec<Error>, Context) {
        let mut batches = Vec::new();
        let mut errors = Vec::new();
        for message in rx.iter() {
            match message {
                ReaderMessage::Batch(batch) => batches.push(batch),
                ReaderMessage::Error(err) => errors.push(err),
                ReaderMessage::EndOfStream(context) => return (batches, errors, context),
            }
        }
        panic!("reader hung up without end-of-stream");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(InputFormat::from_path("a.JSON".as_ref()), InputFormat::Json);
        assert_eq!(InputFormat::from_path("a.tsv".as_ref()), InputFormat::Tsv);
        assert_eq!(InputFormat::from_path("a.txt".as_ref()), InputFormat::Csv);
    }

    #[test]
    fn test_batches_and_context_across_files() {
        let first = temp_file(".csv", "a,b\n1,2\n3,4\n5,6\n");
        let second = temp_file(".csv", "a,b\n7,8\n");
        let (tx, rx) = unbounded();
        let (_done_tx, done_rx) = bounded(1);

        Reader::new(
            InputFormat::Csv,
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
        )
        .with_records_per_batch(2)
        .run(tx, done_rx);

        let (batches, errors, context) = collect(rx);
        assert!(errors.is_empty());
        assert_eq!(
            batches.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![2, 2]
        );

        let last = &batches[1][1];
        assert_eq!(last.record.get("a"), Some(&Value::Int(7)));
        assert_eq!(last.context.nr, 4);
        assert_eq!(last.context.fnr, 1);
        assert_eq!(last.context.filenum, 2);
        assert_eq!(context.nr, 4);
    }

    #[test]
    fn test_missing_file_sends_error_then_end_of_stream() {
        let (tx, rx) = unbounded();
        let (_done_tx, done_rx) = bounded(1);

        Reader::new(InputFormat::Csv, vec![PathBuf::from("/no/such/file.csv")]).run(tx, done_rx);

        let (batches, errors, _) = collect(rx);
        assert!(batches.is_empty());
        assert!(matches!(errors.as_slice(), [Error::Open { .. }]));
    }

    #[test]
    fn test_done_signal_stops_reader() {
        let content = std::iter::once("n\n".to_string())
            .chain((1..=100).map(|i| format!("{i}\n")))
            .collect::<String>();
        let file = temp_file(".csv", &content);
        let (tx, rx) = unbounded();
        let (done_tx, done_rx) = bounded(1);
        done_tx.send(()).unwrap();

        Reader::new(InputFormat::Csv, vec![file.path().to_path_buf()])
            .with_records_per_batch(10)
            .run(tx, done_rx);

        let (batches, errors, _) = collect(rx);
        assert!(errors.is_empty());
        assert!(batches.is_empty());
    }

    #[test]
    fn test_hung_up_done_channel_counts_as_cancelled() {
        let file = temp_file(".csv", "n\n1\n2\n");
        let (tx, rx) = unbounded();
        let (done_tx, done_rx) = bounded::<()>(1);
        drop(done_tx);

        Reader::new(InputFormat::Csv, vec![file.path().to_path_buf()]).run(tx, done_rx);

        let (batches, _, _) = collect(rx);
        assert!(batches.is_empty());
    }
}
