//! The record pipeline: reader thread → evaluator → writer thread.
//!
//! The evaluator runs on the calling thread because the engine holds the
//! program's function table and the persistent global frames, and those stay
//! on one thread for the life of the stream.

use std::thread;

use crossbeam_channel::{Sender, bounded};
use miette::miette;
use mlr_lang::{Context, Engine, Output, Record};
use tracing::debug;

use crate::{
    input::{Reader, ReaderMessage},
    output::RecordWriter,
};

/// Capacity, in messages, of the channels between pipeline stages.
pub const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    /// Stop after this many records have been written.
    pub head: Option<usize>,
    /// Flush the writer after every message.
    pub unbuffered: bool,
}

#[derive(Debug)]
enum WriterMessage {
    Record(Record),
    Text(String),
}

/// Runs `begin` blocks, every record from `reader` (none when it is
/// `None`), then `end` blocks, sending results to `writer`.
pub fn run(
    engine: &mut Engine,
    reader: Option<Reader>,
    writer: Box<dyn RecordWriter + Send>,
    options: &StreamOptions,
) -> miette::Result<()> {
    let (writer_tx, writer_rx) = bounded::<WriterMessage>(CHANNEL_CAPACITY);
    let unbuffered = options.unbuffered;

    thread::scope(|scope| {
        let writer_thread = scope.spawn(move || {
            let mut writer = writer;
            for message in writer_rx.iter() {
                match message {
                    WriterMessage::Record(record) => writer.write_record(&record)?,
                    WriterMessage::Text(text) => writer.write_text(&text)?,
                }
                if unbuffered {
                    writer.flush()?;
                }
            }
            writer.finish()
        });

        let mut forwarder = Forwarder::new(&writer_tx, options.head);
        let evaluated = evaluate(scope, engine, reader, &mut forwarder);
        drop(forwarder);
        drop(writer_tx);

        let written = writer_thread
            .join()
            .map_err(|_| miette!("writer thread panicked"))?;
        evaluated?;
        written.map_err(miette::Report::new)
    })
}

fn evaluate<'scope>(
    scope: &'scope thread::Scope<'scope, '_>,
    engine: &mut Engine,
    reader: Option<Reader>,
    forwarder: &mut Forwarder,
) -> miette::Result<()> {
    forwarder.forward(engine.execute_begin()?);

    let Some(reader) = reader else {
        forwarder.forward(engine.execute_end(&Context::new())?);
        return Ok(());
    };

    let (record_tx, record_rx) = bounded::<ReaderMessage>(CHANNEL_CAPACITY);
    let (done_tx, done_rx) = bounded::<()>(1);
    scope.spawn(move || reader.run(record_tx, done_rx));

    let mut context = Context::new();
    let mut read_error = None;
    'messages: for message in record_rx.iter() {
        match message {
            ReaderMessage::Batch(batch) => {
                debug!(records = batch.len(), "batch received");
                for item in batch {
                    let processed = engine.execute(item.record, &item.context)?;
                    context = item.context;

                    let mut outputs = processed.outputs;
                    outputs.extend(processed.record.map(Output::Record));
                    if !forwarder.forward(outputs) {
                        let _ = done_tx.try_send(());
                        break 'messages;
                    }
                }
            }
            ReaderMessage::Error(err) => {
                read_error.get_or_insert(err);
            }
            ReaderMessage::EndOfStream(final_context) => {
                context = final_context;
                break;
            }
        }
    }
    drop(record_rx);

    if let Some(err) = read_error {
        return Err(err.into());
    }
    forwarder.forward(engine.execute_end(&context)?);
    Ok(())
}

/// Sends evaluator output to the writer, enforcing the record limit.
struct Forwarder<'a> {
    tx: &'a Sender<WriterMessage>,
    head: Option<usize>,
    records_written: usize,
}

impl<'a> Forwarder<'a> {
    fn new(tx: &'a Sender<WriterMessage>, head: Option<usize>) -> Self {
        Self {
            tx,
            head,
            records_written: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.head.is_some_and(|head| self.records_written >= head)
    }

    /// Returns false once no more records are wanted downstream.
    fn forward(&mut self, outputs: Vec<Output>) -> bool {
        for output in outputs {
            let message = match output {
                Output::Record(_) if self.is_full() => return false,
                Output::Record(record) => {
                    self.records_written += 1;
                    WriterMessage::Record(record)
                }
                Output::Stdout(text) => WriterMessage::Text(text),
                Output::Stderr(text) => {
                    eprint!("{}", text);
                    continue;
                }
            };
            if self.tx.send(message).is_err() {
                return false;
            }
        }
        !self.is_full()
    }
}
